// src/infrastructure/security/mod.rs
pub mod nonce;
pub mod session_store;
pub mod verifier;

use md5::{Digest, Md5};

/// Lowercase hex MD5, the shape RFC 2617 expects for HA1/HA2/response values.
pub fn md5_hex(data: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(data.as_bytes());
    hex::encode(hasher.finalize())
}

/// `HA1 = MD5(username:realm:password)`.
pub fn ha1(username: &str, realm: &str, password: &str) -> String {
    md5_hex(&format!("{username}:{realm}:{password}"))
}
