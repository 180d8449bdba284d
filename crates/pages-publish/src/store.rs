use crate::outcome::UploadOutcome;

/// Errors from a remote content store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(String),

    /// The store answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("parse error: {0}")]
    Parse(String),
}

impl StoreError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::Network(_) | Self::Parse(_) => None,
        }
    }
}

/// A create-or-update request for a single path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    pub path: String,
    pub content: Vec<u8>,
    pub message: String,
    /// Version token of the object being replaced. `None` means create.
    pub sha: Option<String>,
}

/// A remote store addressed by path, with token-gated overwrites.
///
/// Implementors provide the two primitives; [`ContentStore::write`] composes
/// them into the lookup-then-write sequence used for every file.
#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    /// Human-readable label identifying this store.
    fn label(&self) -> &str;

    /// Version token of the object at `path`, or `None` when there is none.
    async fn version_token(&self, path: &str) -> Result<Option<String>, StoreError>;

    /// Create or update the object. Returns the success status code.
    async fn put(&self, request: &WriteRequest) -> Result<u16, StoreError>;

    /// Look up the current token, then write. Never fails the caller: every
    /// problem becomes a failed [`UploadOutcome`].
    async fn write(&self, path: &str, content: Vec<u8>, message: &str) -> UploadOutcome {
        let sha = match self.version_token(path).await {
            Ok(sha) => sha,
            Err(e) => {
                tracing::warn!(path, error = %e, "version lookup failed, writing without sha");
                None
            }
        };

        let request = WriteRequest {
            path: path.to_owned(),
            content,
            message: message.to_owned(),
            sha,
        };

        match self.put(&request).await {
            Ok(status) => {
                let action = if request.sha.is_some() { "updated" } else { "created" };
                UploadOutcome::succeeded(path, status, action)
            }
            Err(StoreError::Rejected { status, body }) => {
                UploadOutcome::failed(path, Some(status), body)
            }
            Err(e) => UploadOutcome::failed(path, None, e.to_string()),
        }
    }
}
