use serde::{Deserialize, Serialize};

/// Metadata from GitHub's Contents API.
/// `GET /repos/{owner}/{repo}/contents/{path}?ref={branch}`
#[derive(Debug, Deserialize)]
pub struct ContentResponse {
    pub sha: Option<String>,
}

/// Body of a create-or-update request.
/// `PUT /repos/{owner}/{repo}/contents/{path}`
#[derive(Debug, Serialize)]
pub struct PutContentRequest<'a> {
    pub message: &'a str,
    /// Base64 of the raw file bytes.
    pub content: String,
    pub branch: &'a str,
    /// Required when replacing an existing file, omitted when creating one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
}
