// src/application/session.rs
use crate::application::ApplicationResult;
use crate::application::ports::session::SessionStore;
use std::sync::Arc;

/// Maps an opaque session id to the authenticated username so repeat requests
/// skip header parsing and credential verification while the session is
/// fresh.
pub struct SessionBinder {
    store: Arc<dyn SessionStore>,
    username_key: String,
}

impl SessionBinder {
    pub fn new(store: Arc<dyn SessionStore>, username_key: impl Into<String>) -> Self {
        Self {
            store,
            username_key: username_key.into(),
        }
    }

    pub async fn remember_identity(
        &self,
        session_id: &str,
        username: &str,
    ) -> ApplicationResult<()> {
        self.store.set(session_id, &self.username_key, username).await
    }

    pub async fn load_identity(&self, session_id: &str) -> ApplicationResult<Option<String>> {
        self.store.get(session_id, &self.username_key).await
    }

    pub async fn clear_identity(&self, session_id: &str) -> ApplicationResult<()> {
        self.store.remove(session_id, &self.username_key).await
    }

    pub fn store(&self) -> Arc<dyn SessionStore> {
        Arc::clone(&self.store)
    }
}
