use std::time::Duration;

use pages_publish::{ContentStore, RemoteTarget, StoreError, WriteRequest};
use pages_publish_github::{GitHubContentsClient, GitHubContentsConfig};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONTENT_PATH: &str = "/repos/test-owner/test-repo/contents/js/nav.js";

fn client_for(server: &MockServer) -> GitHubContentsClient {
    let target =
        RemoteTarget::new("test-owner", "test-repo", "main").with_api_base_url(server.uri());
    GitHubContentsClient::new(GitHubContentsConfig::new(target, "secret-token")).unwrap()
}

fn write_request(sha: Option<&str>) -> WriteRequest {
    WriteRequest {
        path: "js/nav.js".into(),
        content: b"export const nav = [];\n".to_vec(),
        message: "Publish js/nav.js".into(),
        sha: sha.map(|s| s.into()),
    }
}

async fn put_bodies(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "PUT")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

#[tokio::test]
async fn version_token_reads_sha_on_branch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CONTENT_PATH))
        .and(query_param("ref", "main"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "nav.js",
            "path": "js/nav.js",
            "sha": "3d21ec53a331a6f037a91c368710b99387d012c1",
            "type": "file"
        })))
        .mount(&server)
        .await;

    let token = client_for(&server).version_token("js/nav.js").await.unwrap();
    assert_eq!(
        token.as_deref(),
        Some("3d21ec53a331a6f037a91c368710b99387d012c1")
    );
}

#[tokio::test]
async fn version_token_is_none_for_404() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CONTENT_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"message":"Not Found"}"#))
        .mount(&server)
        .await;

    let token = client_for(&server).version_token("js/nav.js").await.unwrap();
    assert!(token.is_none());
}

#[tokio::test]
async fn version_token_surfaces_other_statuses() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CONTENT_PATH))
        .respond_with(
            ResponseTemplate::new(403).set_body_string(r#"{"message":"API rate limit exceeded"}"#),
        )
        .mount(&server)
        .await;

    let result = client_for(&server).version_token("js/nav.js").await;
    assert!(matches!(result, Err(StoreError::Rejected { status: 403, .. })));
}

#[tokio::test]
async fn put_without_sha_creates() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(CONTENT_PATH))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let status = client_for(&server).put(&write_request(None)).await.unwrap();
    assert_eq!(status, 201);

    let bodies = put_bodies(&server).await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["content"], "ZXhwb3J0IGNvbnN0IG5hdiA9IFtdOwo=");
    assert_eq!(bodies[0]["message"], "Publish js/nav.js");
    assert_eq!(bodies[0]["branch"], "main");
    assert!(bodies[0].get("sha").is_none());
}

#[tokio::test]
async fn put_with_sha_updates() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(CONTENT_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let status = client_for(&server)
        .put(&write_request(Some("abc123")))
        .await
        .unwrap();
    assert_eq!(status, 200);

    let bodies = put_bodies(&server).await;
    assert_eq!(bodies[0]["sha"], "abc123");
}

#[tokio::test]
async fn write_looks_up_then_updates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CONTENT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "path": "js/nav.js",
            "sha": "old-sha"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENT_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client_for(&server)
        .write("js/nav.js", b"new".to_vec(), "Publish js/nav.js")
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.status_code, Some(200));
    assert_eq!(outcome.message.as_deref(), Some("updated"));
    assert_eq!(put_bodies(&server).await[0]["sha"], "old-sha");
}

#[tokio::test]
async fn write_proceeds_without_sha_when_lookup_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CONTENT_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENT_PATH))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let outcome = client_for(&server)
        .write("js/nav.js", b"new".to_vec(), "Publish js/nav.js")
        .await;

    assert!(outcome.success);
    assert!(put_bodies(&server).await[0].get("sha").is_none());
}

#[tokio::test]
async fn write_reports_rejection_with_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CONTENT_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENT_PATH))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_string(r#"{"message":"js/nav.js does not match old-sha"}"#),
        )
        .mount(&server)
        .await;

    let outcome = client_for(&server)
        .write("js/nav.js", b"new".to_vec(), "Publish js/nav.js")
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.status_code, Some(409));
    assert_eq!(
        outcome.message.as_deref(),
        Some(r#"{"message":"js/nav.js does not match old-sha"}"#)
    );
}

#[tokio::test]
async fn slow_write_times_out_as_failed_outcome() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CONTENT_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENT_PATH))
        .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let target =
        RemoteTarget::new("test-owner", "test-repo", "main").with_api_base_url(server.uri());
    let mut config = GitHubContentsConfig::new(target, "secret-token");
    config.timeout = Duration::from_millis(200);
    let client = GitHubContentsClient::new(config).unwrap();

    let outcome = client
        .write("js/nav.js", b"new".to_vec(), "Publish js/nav.js")
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.status_code, None);
    assert!(outcome.message.unwrap().contains("timed out"));
}

#[tokio::test]
async fn unreachable_api_is_a_failed_outcome() {
    let target = RemoteTarget::new("test-owner", "test-repo", "main")
        .with_api_base_url("http://127.0.0.1:1");
    let client = GitHubContentsClient::new(GitHubContentsConfig::new(target, "t")).unwrap();

    let outcome = client.write("js/nav.js", b"x".to_vec(), "Publish").await;
    assert!(!outcome.success);
    assert_eq!(outcome.status_code, None);
}
