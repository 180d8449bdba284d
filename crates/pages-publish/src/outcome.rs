use std::fmt;

/// The result of publishing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub path: String,
    pub success: bool,
    /// HTTP status of the write, when one was received.
    pub status_code: Option<u16>,
    /// `created` / `updated` on success, the error or response body on failure.
    pub message: Option<String>,
}

impl UploadOutcome {
    pub fn succeeded(
        path: impl Into<String>,
        status_code: u16,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            success: true,
            status_code: Some(status_code),
            message: Some(message.into()),
        }
    }

    pub fn failed(
        path: impl Into<String>,
        status_code: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            success: false,
            status_code,
            message: Some(message.into()),
        }
    }
}

impl fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.success { "ok" } else { "failed" };
        write!(f, "{verdict} {}", self.path)?;
        if let Some(code) = self.status_code {
            write!(f, " (HTTP {code})")?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

/// Every outcome of a run, in the order files were attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub outcomes: Vec<UploadOutcome>,
}

impl PublishReport {
    /// True when nothing was eligible for publishing.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// True iff every attempted file succeeded. An empty run counts as success.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.success)
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &UploadOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }
}
