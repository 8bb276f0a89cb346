// src/application/dto.rs
use crate::domain::identity::{Ability, AuthScheme};
use std::collections::HashSet;

/// Per-request credential bundle filled in by a protocol adapter and consumed
/// by the verifier. Born when the request's auth header (or login form) is
/// parsed, dropped with the request.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: String,
    /// The presented secret: the cleartext password for Basic and form login,
    /// or the `response` digest for Digest. Never rewritten after parse; HA1
    /// normalization happens in the verifier on a derived value.
    pub password: String,
    /// True when `password` is already in hashed form (Digest response).
    pub encoded: bool,
    /// Scheme advertised by the client, when any.
    pub scheme: Option<AuthScheme>,
    pub digest: Option<DigestAttempt>,
}

/// Digest-only protocol fields, including the digest the server computed for
/// comparison.
#[derive(Debug, Clone)]
pub struct DigestAttempt {
    pub realm: String,
    pub nonce: String,
    pub cnonce: String,
    pub nc: String,
    pub qop: String,
    pub opaque: Option<String>,
    pub uri: String,
    /// Server-side `MD5(HA1:nonce[:nc:cnonce:qop]:HA2)` for this request.
    pub expected: String,
}

/// The identity a request runs under once the gate admits it.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub username: String,
    pub abilities: HashSet<Ability>,
}

impl AuthenticatedUser {
    pub fn has_ability(&self, ability: &str) -> bool {
        self.abilities.iter().any(|a| a.as_str() == ability)
    }

    /// Empty requirement sets admit any authenticated user.
    pub fn satisfies(&self, required: &HashSet<Ability>) -> bool {
        required.iter().all(|a| self.abilities.contains(a))
    }
}
