use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{ContentStore, StoreError, WriteRequest};

/// In-memory content store for testing.
///
/// Behaves like the GitHub Contents API where it matters: overwriting an
/// existing object needs its current token, and every write mints a new one.
/// Records each lookup and write so tests can assert on them.
pub struct InMemoryStore {
    label: String,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    objects: HashMap<String, StoredObject>,
    rejections: HashMap<String, (u16, String)>,
    fail_lookups: bool,
    lookups: Vec<(String, Option<String>)>,
    puts: Vec<WriteRequest>,
    next_version: u64,
}

struct StoredObject {
    content: Vec<u8>,
    sha: String,
}

impl State {
    fn mint_sha(&mut self) -> String {
        self.next_version += 1;
        format!("sha-{}", self.next_version)
    }
}

impl InMemoryStore {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Place an object in the store as if it had been published earlier.
    /// Returns its token.
    pub fn seed(&self, path: &str, content: &[u8]) -> String {
        let mut state = self.state();
        let sha = state.mint_sha();
        state.objects.insert(
            path.to_owned(),
            StoredObject {
                content: content.to_vec(),
                sha: sha.clone(),
            },
        );
        sha
    }

    /// Make every write to `path` fail with the given status and body.
    pub fn reject(&self, path: &str, status: u16, body: &str) {
        self.state()
            .rejections
            .insert(path.to_owned(), (status, body.to_owned()));
    }

    /// Make every token lookup fail with a network error.
    pub fn fail_lookups(&self) {
        self.state().fail_lookups = true;
    }

    /// Every successful lookup, with the token it found.
    pub fn lookups(&self) -> Vec<(String, Option<String>)> {
        self.state().lookups.clone()
    }

    /// Every write request received, accepted or not.
    pub fn puts(&self) -> Vec<WriteRequest> {
        self.state().puts.clone()
    }

    pub fn content(&self, path: &str) -> Option<Vec<u8>> {
        self.state().objects.get(path).map(|o| o.content.clone())
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.state().objects.keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[async_trait::async_trait]
impl ContentStore for InMemoryStore {
    fn label(&self) -> &str {
        &self.label
    }

    async fn version_token(&self, path: &str) -> Result<Option<String>, StoreError> {
        let mut state = self.state();
        if state.fail_lookups {
            return Err(StoreError::Network("lookup unavailable".into()));
        }

        let sha = state.objects.get(path).map(|o| o.sha.clone());
        state.lookups.push((path.to_owned(), sha.clone()));
        Ok(sha)
    }

    async fn put(&self, request: &WriteRequest) -> Result<u16, StoreError> {
        let mut state = self.state();
        state.puts.push(request.clone());

        if let Some((status, body)) = state.rejections.get(&request.path) {
            return Err(StoreError::Rejected {
                status: *status,
                body: body.clone(),
            });
        }

        let status = match (state.objects.get(&request.path), &request.sha) {
            (Some(_), None) => {
                return Err(StoreError::Rejected {
                    status: 422,
                    body: r#"{"message":"\"sha\" wasn't supplied."}"#.into(),
                });
            }
            (Some(existing), Some(sha)) if existing.sha != *sha => {
                return Err(StoreError::Rejected {
                    status: 409,
                    body: format!(r#"{{"message":"{} does not match {sha}"}}"#, request.path),
                });
            }
            (Some(_), Some(_)) => 200,
            (None, _) => 201,
        };

        let sha = state.mint_sha();
        state.objects.insert(
            request.path.clone(),
            StoredObject {
                content: request.content.clone(),
                sha,
            },
        );
        Ok(status)
    }
}
