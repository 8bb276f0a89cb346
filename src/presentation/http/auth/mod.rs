// src/presentation/http/auth/mod.rs
pub mod basic;
pub mod digest;
pub mod form;

use crate::domain::identity::{Ability, AuthScheme};
use crate::presentation::http::state::HttpState;
use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::Response;
use headers::{Cookie, HeaderMapExt};
use std::collections::HashSet;
use uuid::Uuid;

/// Cookie carrying the opaque session id. The id means nothing outside the
/// session store.
pub const SESSION_COOKIE: &str = "GATEHOUSE_SESSION";

/// Authentication binding for a route: which protocol identifies the caller
/// and which abilities the caller must hold. Immutable once the router is
/// built.
#[derive(Debug, Clone, Default)]
pub struct RoutePolicy {
    pub scheme: AuthScheme,
    pub required: HashSet<Ability>,
}

impl RoutePolicy {
    pub fn new(scheme: AuthScheme) -> Self {
        Self {
            scheme,
            required: HashSet::new(),
        }
    }

    pub fn require(mut self, ability: impl Into<String>) -> Self {
        self.required.insert(Ability::new(ability));
        self
    }
}

/// Scheme token and detail part of the `Authorization` header, if one is
/// present and readable. The token comes back lowercased.
pub(crate) fn split_authorization(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((scheme, details)) => {
            Some((scheme.to_ascii_lowercase(), details.trim_start().to_string()))
        }
        None => Some((trimmed.to_ascii_lowercase(), String::new())),
    }
}

pub(crate) fn session_id_from(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Cookie>()?
        .get(SESSION_COOKIE)
        .map(|v| v.to_string())
}

pub(crate) fn mint_session_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) fn session_cookie_header(session_id: &str) -> HeaderValue {
    // The id is a UUID, always a valid header value.
    HeaderValue::from_str(&format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly"))
        .expect("session cookie value")
}

/// Ask the client to log in, in whatever way the route's protocol asks.
pub fn challenge(state: &HttpState, scheme: AuthScheme) -> Response {
    match scheme {
        AuthScheme::Basic => basic::challenge(state.config.realm()),
        AuthScheme::Digest => digest::challenge(state),
        AuthScheme::Form | AuthScheme::None => form::challenge(state),
    }
}
