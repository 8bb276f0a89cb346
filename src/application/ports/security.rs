// src/application/ports/security.rs
use crate::application::{
    ApplicationResult,
    dto::{AuthenticatedUser, Credentials},
};
use async_trait::async_trait;

/// Pluggable credential comparison. The built-in implementation checks the
/// bundle against the identity directory; deployments may substitute a
/// platform verifier (e.g. one backed by the host's account database) that
/// provisions directory entries on first success.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, credentials: &Credentials) -> ApplicationResult<AuthenticatedUser>;
}
