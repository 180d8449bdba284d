pub mod client;
pub mod content;

pub use client::{DEFAULT_TIMEOUT, GitHubContentsClient, GitHubContentsConfig};
