use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::entry::{EnumerateError, Enumerator, FileEntry};
use crate::outcome::{PublishReport, UploadOutcome};
use crate::store::ContentStore;

/// Zero-byte marker that turns off the hosting platform's site preprocessing.
pub const SENTINEL_FILE: &str = ".nojekyll";

/// Errors that stop a run before any file is attempted.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("source folder not found or not a directory: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("failed to read source folder {}: {source}", .path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Commit message recorded for one published file.
pub fn commit_message(relative_path: &str, at: DateTime<Utc>) -> String {
    format!("Publish {relative_path} at {}", at.to_rfc3339())
}

/// Publishes a local tree into a [`ContentStore`], one file at a time.
#[derive(Debug, Clone)]
pub struct Publisher {
    enumerator: Enumerator,
    sentinel: Option<String>,
}

impl Publisher {
    pub fn new(source_root: impl Into<PathBuf>) -> Self {
        Self::with_enumerator(Enumerator::new(source_root))
    }

    pub fn with_enumerator(enumerator: Enumerator) -> Self {
        Self {
            enumerator,
            sentinel: Some(SENTINEL_FILE.to_owned()),
        }
    }

    /// Skip creating the sentinel file.
    pub fn without_sentinel(mut self) -> Self {
        self.sentinel = None;
        self
    }

    pub fn source_root(&self) -> &Path {
        self.enumerator.root()
    }

    /// Enumerate what a run would publish, without writing anything.
    pub fn plan(&self) -> Result<Vec<Result<FileEntry, EnumerateError>>, PublishError> {
        Ok(self.enumerator.entries()?.collect())
    }

    /// Publish every eligible file and report each outcome.
    ///
    /// Per-file problems (unreadable file, rejected write, network failure)
    /// land in the report and the run moves on. Only a missing or unreadable
    /// source root is an error. An empty tree returns an empty report and
    /// leaves the tree untouched.
    pub async fn run(&self, store: &dyn ContentStore) -> Result<PublishReport, PublishError> {
        if self.enumerator.entries()?.next().is_none() {
            tracing::info!(root = %self.source_root().display(), "nothing to publish");
            return Ok(PublishReport::default());
        }

        self.ensure_sentinel();

        tracing::info!(
            root = %self.source_root().display(),
            store = store.label(),
            "publishing"
        );

        let mut report = PublishReport::default();
        for entry in self.enumerator.entries()? {
            let outcome = match entry {
                Ok(entry) => publish_entry(store, entry).await,
                Err(e) => {
                    UploadOutcome::failed(e.relative_path(self.source_root()), None, e.to_string())
                }
            };

            if outcome.success {
                tracing::info!(path = %outcome.path, status = ?outcome.status_code, "published");
            } else {
                tracing::error!(
                    path = %outcome.path,
                    status = ?outcome.status_code,
                    detail = outcome.message.as_deref().unwrap_or_default(),
                    "failed to publish"
                );
            }
            report.outcomes.push(outcome);
        }

        Ok(report)
    }

    /// Create the sentinel when missing. An existing file is left alone.
    fn ensure_sentinel(&self) {
        let Some(name) = &self.sentinel else {
            return;
        };

        let path = self.source_root().join(name);
        if path.exists() {
            return;
        }

        if let Err(e) = std::fs::write(&path, b"") {
            tracing::warn!(path = %path.display(), error = %e, "could not create sentinel file");
        }
    }
}

async fn publish_entry(store: &dyn ContentStore, entry: FileEntry) -> UploadOutcome {
    let content = match std::fs::read(&entry.absolute_path) {
        Ok(content) => content,
        Err(e) => {
            return UploadOutcome::failed(
                entry.relative_path,
                None,
                format!("failed to read {}: {e}", entry.absolute_path.display()),
            );
        }
    };

    let message = commit_message(&entry.relative_path, Utc::now());
    store.write(&entry.relative_path, content, &message).await
}
