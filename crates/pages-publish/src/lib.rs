pub mod entry;
pub mod outcome;
pub mod publish;
pub mod store;
pub mod target;

pub use entry::{EnumerateError, Enumerator, FileEntry};
pub use outcome::{PublishReport, UploadOutcome};
pub use publish::{PublishError, Publisher, SENTINEL_FILE, commit_message};
pub use store::{ContentStore, StoreError, WriteRequest};
pub use target::RemoteTarget;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
