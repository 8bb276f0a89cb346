// src/infrastructure/security/nonce.rs
use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::ports::time::Clock;
use crate::infrastructure::security::md5_hex;
use base64::{Engine, engine::general_purpose::STANDARD};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use uuid::Uuid;

/// Mints and validates RFC 2617 Digest nonces.
///
/// A nonce is `base64(secret:realm:issuedHex:counterHex)`. The secret is
/// minted per issuer, so a nonce only validates against the process that
/// issued it; the counter makes every nonce distinct within a second.
pub struct NonceIssuer {
    secret: String,
    realm: String,
    lifetime: Duration,
    counter: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl NonceIssuer {
    pub fn new(realm: impl Into<String>, lifetime: Duration, clock: Arc<dyn Clock>) -> Self {
        let seed = format!("{}:{}", Uuid::new_v4(), clock.now().timestamp_nanos_opt().unwrap_or_default());
        Self::with_secret(md5_hex(&seed), realm, lifetime, clock)
    }

    /// Issuer with a caller-chosen secret. Lets tests pin the secret and lets
    /// a deployment share one across restarts.
    pub fn with_secret(
        secret: impl Into<String>,
        realm: impl Into<String>,
        lifetime: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            secret: secret.into(),
            realm: realm.into(),
            lifetime,
            counter: AtomicU64::new(0),
            clock,
        }
    }

    pub fn mint(&self) -> String {
        let issued = self.clock.now().timestamp();
        let count = self.counter.fetch_add(1, Ordering::Relaxed);
        STANDARD.encode(format!("{}:{}:{:x}:{:x}", self.secret, self.realm, issued, count))
    }

    /// Reject anything not minted by this issuer for this realm, and anything
    /// older than the configured lifetime.
    pub fn validate(&self, nonce: &str) -> ApplicationResult<()> {
        let decoded = STANDARD
            .decode(nonce)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or_else(|| ApplicationError::unauthorized("undecodable nonce"))?;

        let mut parts = decoded.splitn(4, ':');
        let secret = parts.next().unwrap_or_default();
        let realm = parts.next().unwrap_or_default();
        let issued_hex = parts.next().unwrap_or_default();
        let issued = i64::from_str_radix(issued_hex, 16)
            .map_err(|_| ApplicationError::unauthorized("malformed nonce timestamp"))?;

        if secret != self.secret {
            tracing::trace!("access denied: nonce mismatch");
            return Err(ApplicationError::unauthorized("nonce mismatch"));
        }
        if realm != self.realm {
            tracing::trace!("access denied: realm mismatch");
            return Err(ApplicationError::unauthorized("realm mismatch"));
        }
        let now = self.clock.now().timestamp();
        if issued + (self.lifetime.as_secs() as i64) < now {
            tracing::trace!("access denied: nonce is stale");
            return Err(ApplicationError::unauthorized("stale nonce"));
        }
        Ok(())
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }
}
