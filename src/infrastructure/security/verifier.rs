// src/infrastructure/security/verifier.rs
use crate::application::{
    dto::{AuthenticatedUser, Credentials},
    error::{ApplicationError, ApplicationResult},
    ports::security::CredentialVerifier,
};
use crate::domain::identity::Directory;
use crate::infrastructure::security::ha1;
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// Checks a credential bundle against the identity directory.
///
/// Performs no I/O and never mutates the directory. The presented password is
/// left untouched; when it is not already encoded the comparison runs on a
/// derived `MD5(user:realm:password)` value, so retries never double-hash.
pub struct LocalVerifier {
    directory: Arc<RwLock<Directory>>,
    realm: String,
}

impl LocalVerifier {
    pub fn new(directory: Arc<RwLock<Directory>>, realm: impl Into<String>) -> Self {
        Self {
            directory,
            realm: realm.into(),
        }
    }
}

#[async_trait]
impl CredentialVerifier for LocalVerifier {
    async fn verify(&self, credentials: &Credentials) -> ApplicationResult<AuthenticatedUser> {
        let directory = self.directory.read().unwrap();
        let Some(user) = directory.lookup_user(&credentials.username) else {
            tracing::trace!(user = %credentials.username, "verify: unknown user");
            return Err(ApplicationError::unauthorized("invalid credentials"));
        };

        let presented = if credentials.encoded {
            credentials.password.clone()
        } else {
            ha1(&credentials.username, &self.realm, &credentials.password)
        };

        let matches = match &credentials.digest {
            // Digest: the client's response against the digest we computed.
            Some(digest) => presented == digest.expected,
            // Basic/form: the normalized password against the stored record.
            None => presented == user.password,
        };

        if matches {
            tracing::trace!(user = %credentials.username, "user authenticated");
            Ok(AuthenticatedUser {
                username: user.name.as_str().to_string(),
                abilities: user.abilities.clone(),
            })
        } else {
            tracing::trace!(user = %credentials.username, "password failed to authenticate");
            Err(ApplicationError::unauthorized("invalid credentials"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::DigestAttempt;
    use crate::infrastructure::security::md5_hex;

    fn directory_with(name: &str, password: &str) -> Arc<RwLock<Directory>> {
        let mut directory = Directory::default();
        directory.add_user(name, password, "admin").unwrap();
        Arc::new(RwLock::new(directory))
    }

    fn basic_credentials(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.into(),
            password: password.into(),
            encoded: false,
            scheme: None,
            digest: None,
        }
    }

    #[tokio::test]
    async fn cleartext_password_is_compared_in_ha1_form() {
        let stored = ha1("alice", "example.com", "secret");
        let verifier = LocalVerifier::new(directory_with("alice", &stored), "example.com");

        let user = verifier
            .verify(&basic_credentials("alice", "secret"))
            .await
            .unwrap();
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_both_fail_closed() {
        let stored = ha1("alice", "example.com", "secret");
        let verifier = LocalVerifier::new(directory_with("alice", &stored), "example.com");

        assert!(verifier.verify(&basic_credentials("alice", "wrong")).await.is_err());
        assert!(verifier.verify(&basic_credentials("mallory", "secret")).await.is_err());
    }

    #[tokio::test]
    async fn digest_comparison_uses_the_expected_response() {
        let stored = ha1("bob", "example.com", "secret");
        let verifier = LocalVerifier::new(directory_with("bob", &stored), "example.com");

        let response = md5_hex("not-the-point-here");
        let credentials = Credentials {
            username: "bob".into(),
            password: response.clone(),
            encoded: true,
            scheme: None,
            digest: Some(DigestAttempt {
                realm: "example.com".into(),
                nonce: "n".into(),
                cnonce: "c".into(),
                nc: "00000001".into(),
                qop: "auth".into(),
                opaque: None,
                uri: "/".into(),
                expected: response,
            }),
        };
        assert!(verifier.verify(&credentials).await.is_ok());
    }

    #[tokio::test]
    async fn presented_password_is_not_rewritten_between_attempts() {
        let stored = ha1("alice", "example.com", "secret");
        let verifier = LocalVerifier::new(directory_with("alice", &stored), "example.com");

        let credentials = basic_credentials("alice", "secret");
        verifier.verify(&credentials).await.unwrap();
        // A second pass over the same bundle must still succeed.
        verifier.verify(&credentials).await.unwrap();
        assert_eq!(credentials.password, "secret");
    }
}
