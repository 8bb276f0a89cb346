// src/application/ports/session.rs
use crate::application::ApplicationResult;
use async_trait::async_trait;

/// Opaque session-variable capability: `(session id, key, value)` triples.
/// The store owns expiry and its own concurrency; callers never learn more
/// about a session than the variables they ask for.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: &str, key: &str) -> ApplicationResult<Option<String>>;
    async fn set(&self, session_id: &str, key: &str, value: &str) -> ApplicationResult<()>;
    async fn remove(&self, session_id: &str, key: &str) -> ApplicationResult<()>;
}
