use std::time::Duration;

use base64::Engine;
use pages_publish::{ContentStore, RemoteTarget, StoreError, WriteRequest};
use reqwest::{StatusCode, Url};

use crate::content::{ContentResponse, PutContentRequest};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = "pages-publish";

/// Configuration for a GitHub Contents API store.
#[derive(Debug, Clone)]
pub struct GitHubContentsConfig {
    pub target: RemoteTarget,
    pub token: String,
    /// Applies to each request on its own.
    pub timeout: Duration,
}

impl GitHubContentsConfig {
    pub fn new(target: RemoteTarget, token: impl Into<String>) -> Self {
        Self {
            target,
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Reads and writes single files in one branch of a GitHub repository.
pub struct GitHubContentsClient {
    config: GitHubContentsConfig,
    client: reqwest::Client,
    label: String,
}

impl GitHubContentsClient {
    pub fn new(config: GitHubContentsConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Network(format!("failed to build HTTP client: {e}")))?;

        let label = format!("{}@{}", config.target.slug(), config.target.branch);

        Ok(Self {
            config,
            client,
            label,
        })
    }

    pub fn target(&self) -> &RemoteTarget {
        &self.config.target
    }

    /// `{api}/repos/{owner}/{repo}/contents/{path}`, each segment escaped.
    fn contents_url(&self, path: &str) -> Result<Url, StoreError> {
        let target = &self.config.target;
        let mut url = Url::parse(&target.api_base_url)
            .map_err(|e| StoreError::Parse(format!("invalid API base URL: {e}")))?;

        url.path_segments_mut()
            .map_err(|()| StoreError::Parse("API base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(["repos", target.owner.as_str(), target.repo.as_str(), "contents"])
            .extend(path.split('/'));

        Ok(url)
    }

    fn build_request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.config.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }
}

fn network_error(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Network(format!("request timed out: {e}"))
    } else {
        StoreError::Network(e.to_string())
    }
}

async fn rejected(response: reqwest::Response) -> StoreError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown".into());
    StoreError::Rejected { status, body }
}

#[async_trait::async_trait]
impl ContentStore for GitHubContentsClient {
    fn label(&self) -> &str {
        &self.label
    }

    async fn version_token(&self, path: &str) -> Result<Option<String>, StoreError> {
        let mut url = self.contents_url(path)?;
        url.query_pairs_mut()
            .append_pair("ref", &self.config.target.branch);

        let response = self
            .build_request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(network_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(path, "no existing object");
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(rejected(response).await);
        }

        let metadata: ContentResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;

        Ok(metadata.sha)
    }

    async fn put(&self, request: &WriteRequest) -> Result<u16, StoreError> {
        let url = self.contents_url(&request.path)?;

        let body = PutContentRequest {
            message: &request.message,
            content: base64::engine::general_purpose::STANDARD.encode(&request.content),
            branch: &self.config.target.branch,
            sha: request.sha.as_deref(),
        };

        let response = self
            .build_request(reqwest::Method::PUT, url)
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            return Err(rejected(response).await);
        }

        Ok(response.status().as_u16())
    }
}
