// src/application/services/mod.rs
use std::sync::{Arc, RwLock};

use crate::{
    application::{
        ApplicationResult,
        dto::{AuthenticatedUser, Credentials},
        ports::{security::CredentialVerifier, session::SessionStore},
        session::SessionBinder,
    },
    domain::identity::{AuthScheme, Directory},
};

/// The auth core's service aggregate: one identity directory, one credential
/// verifier, one session binder. Construct once at startup and share.
pub struct AuthServices {
    directory: Arc<RwLock<Directory>>,
    verifier: Arc<dyn CredentialVerifier>,
    sessions: SessionBinder,
}

impl AuthServices {
    pub fn new(
        directory: Arc<RwLock<Directory>>,
        verifier: Arc<dyn CredentialVerifier>,
        session_store: Arc<dyn SessionStore>,
        session_username_key: impl Into<String>,
    ) -> Self {
        Self {
            directory,
            verifier,
            sessions: SessionBinder::new(session_store, session_username_key),
        }
    }

    pub fn directory(&self) -> Arc<RwLock<Directory>> {
        Arc::clone(&self.directory)
    }

    pub fn verifier(&self) -> Arc<dyn CredentialVerifier> {
        Arc::clone(&self.verifier)
    }

    pub fn sessions(&self) -> &SessionBinder {
        &self.sessions
    }

    /// Programmatic login with a cleartext password, as used by the form
    /// `login` action. Verifies, then binds the identity to the session.
    pub async fn login_user(
        &self,
        session_id: &str,
        username: &str,
        password: &str,
    ) -> ApplicationResult<AuthenticatedUser> {
        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
            encoded: false,
            scheme: Some(AuthScheme::Form),
            digest: None,
        };
        let user = self.verifier.verify(&credentials).await?;
        self.sessions.remember_identity(session_id, &user.username).await?;
        Ok(user)
    }

    pub async fn logout_user(&self, session_id: &str) -> ApplicationResult<()> {
        self.sessions.clear_identity(session_id).await
    }

    /// Look a known username up and rebuild its request identity. Used on the
    /// session fast path, where no credentials are re-verified.
    pub fn resolve_identity(&self, username: &str) -> Option<AuthenticatedUser> {
        let directory = self.directory.read().unwrap();
        directory.lookup_user(username).map(|user| AuthenticatedUser {
            username: user.name.as_str().to_string(),
            abilities: user.abilities.clone(),
        })
    }
}
