use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use pages_publish::{PublishReport, Publisher};
use pages_publish_github::GitHubContentsClient;

use crate::config::{self, EnvLookup, FileConfig};

/// How an invocation ended. Configuration problems and partial failures
/// get distinct exit statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Success,
    Fatal,
    PartialFailure,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        match exit {
            Exit::Success => ExitCode::SUCCESS,
            Exit::Fatal => ExitCode::from(1),
            Exit::PartialFailure => ExitCode::from(2),
        }
    }
}

pub fn exit_for(report: &PublishReport) -> Exit {
    if report.is_success() {
        Exit::Success
    } else {
        Exit::PartialFailure
    }
}

/// One-line summary of a run. Individual failures are already logged by
/// the publisher as they happen.
pub fn summary(report: &PublishReport) -> String {
    if report.is_empty() {
        "Nothing to publish (no files found).".to_owned()
    } else if report.is_success() {
        format!("Published {} files.", report.succeeded())
    } else {
        format!(
            "Completed with {} error(s); {} of {} files published.",
            report.failed(),
            report.succeeded(),
            report.outcomes.len()
        )
    }
}

/// Resolve settings and publish the source tree.
///
/// Configuration errors return before a client exists, so no request is made.
pub async fn run(env: EnvLookup<'_>, file: &FileConfig, cwd: &Path) -> Result<Exit> {
    let settings = config::resolve(env, file, cwd)?;

    let client = GitHubContentsClient::new(settings.contents_config())
        .context("failed to set up the GitHub client")?;

    println!(
        "Publishing {} to {} on branch '{}'...",
        settings.source_dir.display(),
        settings.target.slug(),
        settings.target.branch
    );

    let report = Publisher::new(&settings.source_dir).run(&client).await?;
    println!("{}", summary(&report));

    Ok(exit_for(&report))
}

/// List what would be published. Needs no credentials and touches nothing.
pub fn dry_run(env: EnvLookup<'_>, file: &FileConfig, cwd: &Path) -> Result<Exit> {
    let source_dir = config::resolve_source_dir(env, file, cwd);
    let entries = Publisher::new(&source_dir).plan()?;

    let mut count = 0usize;
    for entry in &entries {
        match entry {
            Ok(entry) => {
                println!("{}", entry.relative_path);
                count += 1;
            }
            Err(e) => eprintln!("warning: {e}"),
        }
    }

    println!("{count} file(s) would be published from {}.", source_dir.display());
    Ok(Exit::Success)
}
