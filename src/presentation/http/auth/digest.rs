// src/presentation/http/auth/digest.rs
//! HTTP Digest authentication (RFC 2617), MD5 with `qop="auth"`.

use crate::application::dto::{Credentials, DigestAttempt};
use crate::application::error::{ApplicationError, ApplicationResult};
use crate::domain::identity::AuthScheme;
use crate::infrastructure::security::md5_hex;
use crate::presentation::http::error::HttpError;
use crate::presentation::http::state::HttpState;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;

/// Unused by the protocol; echoed back by clients. Any fixed value works.
const OPAQUE: &str = "5ccc069c403ebaf9f0171e9517f40e41";

/// Parse `Authorization: Digest <k=v, ...>` details, validate the nonce, and
/// compute the digest this request should carry.
///
/// Every rejection is the same `Unauthorized` to the caller; the specific
/// cause only reaches the trace log.
pub fn parse(state: &HttpState, method: &Method, details: &str) -> ApplicationResult<Credentials> {
    let fields = parse_fields(details);
    let field = |key: &str| fields.get(key).cloned();

    let username = field("username").or_else(|| field("user"));
    let realm = field("realm");
    let nonce = field("nonce");
    let response = field("response");
    let (Some(username), Some(realm), Some(nonce), Some(response)) =
        (username, realm, nonce, response)
    else {
        tracing::trace!("digest: required field missing");
        return Err(ApplicationError::unauthorized("invalid credentials"));
    };

    let qop = field("qop");
    let cnonce = field("cnonce");
    let nc = field("nc");
    if qop.is_some() && (cnonce.is_none() || nc.is_none()) {
        tracing::trace!("digest: qop without cnonce/nc");
        return Err(ApplicationError::unauthorized("invalid credentials"));
    }
    let qop = qop.unwrap_or_default();
    if qop != "auth" {
        tracing::trace!(qop = %qop, "access denied: bad qop");
        return Err(ApplicationError::unauthorized("invalid credentials"));
    }

    state.nonces.validate(&nonce)?;

    // HA1 is the stored password: the directory keeps Digest-capable records
    // in MD5(user:realm:password) form already.
    let ha1 = {
        let directory = state.services.directory();
        let directory = directory.read().unwrap();
        match directory.lookup_user(&username) {
            Some(user) => user.password.clone(),
            None => {
                tracing::trace!(user = %username, "access denied: user is unknown");
                return Err(ApplicationError::unauthorized("invalid credentials"));
            }
        }
    };

    let uri = field("uri").unwrap_or_default();
    let cnonce = cnonce.unwrap_or_default();
    let nc = nc.unwrap_or_default();
    let expected = expected_response(&ha1, method.as_str(), &uri, &nonce, &nc, &cnonce, &qop);

    Ok(Credentials {
        username,
        password: response,
        encoded: true,
        scheme: Some(AuthScheme::Digest),
        digest: Some(DigestAttempt {
            realm,
            nonce,
            cnonce,
            nc,
            qop,
            opaque: field("opaque"),
            uri,
            expected,
        }),
    })
}

/// RFC 2617 response computation over a stored HA1.
pub(crate) fn expected_response(
    ha1: &str,
    method: &str,
    uri: &str,
    nonce: &str,
    nc: &str,
    cnonce: &str,
    qop: &str,
) -> String {
    let ha2 = md5_hex(&format!("{method}:{uri}"));
    if qop == "auth" || qop == "auth-int" {
        md5_hex(&format!("{ha1}:{nonce}:{nc}:{cnonce}:{qop}:{ha2}"))
    } else {
        md5_hex(&format!("{ha1}:{nonce}:{ha2}"))
    }
}

pub fn challenge(state: &HttpState) -> Response {
    let nonce = state.nonces.mint();
    let value = format!(
        "Digest realm=\"{}\", domain=\"{}\", qop=\"auth\", nonce=\"{}\", opaque=\"{}\", algorithm=\"MD5\", stale=\"FALSE\"",
        state.config.realm(),
        state.config.server_url(),
        nonce,
        OPAQUE,
    );
    let mut response =
        HttpError::new(StatusCode::UNAUTHORIZED, "authentication required").into_response();
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("Digest")),
    );
    response
}

/// Scan a comma-separated `key=value` list. Values may be double-quoted and
/// contain backslash-escaped characters; keys are case-insensitive; unknown
/// keys are kept (and ignored by the caller).
fn parse_fields(details: &str) -> HashMap<String, String> {
    let chars: Vec<char> = details.chars().collect();
    let mut fields = HashMap::new();
    let mut i = 0;

    while i < chars.len() {
        while i < chars.len() && (chars[i].is_whitespace() || chars[i] == ',') {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }

        let key_start = i;
        while i < chars.len() && chars[i] != '=' && chars[i] != ',' && !chars[i].is_whitespace() {
            i += 1;
        }
        let key: String = chars[key_start..i].iter().collect();
        let key = key.to_ascii_lowercase();

        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() || chars[i] != '=' {
            continue;
        }
        i += 1;
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }

        let mut value = String::new();
        if i < chars.len() && chars[i] == '"' {
            i += 1;
            while i < chars.len() && chars[i] != '"' {
                if chars[i] == '\\' && i + 1 < chars.len() {
                    i += 1;
                }
                value.push(chars[i]);
                i += 1;
            }
            i += 1;
        } else {
            while i < chars.len() && chars[i] != ',' {
                value.push(chars[i]);
                i += 1;
            }
            value = value.trim_end().to_string();
        }

        if !key.is_empty() {
            fields.insert(key, value);
        }
    }
    fields
}
