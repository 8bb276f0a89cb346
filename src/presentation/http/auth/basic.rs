// src/presentation/http/auth/basic.rs
use crate::application::dto::Credentials;
use crate::domain::identity::AuthScheme;
use crate::presentation::http::error::HttpError;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use base64::{Engine, engine::general_purpose::STANDARD};

/// Decode `Authorization: Basic <base64>` details into a credential bundle.
///
/// The payload splits at the first `:`; either side may legitimately be
/// empty, and a missing `:` leaves both sides empty so the gate falls
/// through to a challenge rather than a hard error.
pub fn parse(details: &str) -> Option<Credentials> {
    let decoded = STANDARD.decode(details.trim()).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (username, password) = match text.split_once(':') {
        Some((user, pass)) => (user.to_string(), pass.to_string()),
        None => (String::new(), String::new()),
    };
    Some(Credentials {
        username,
        password,
        encoded: false,
        scheme: Some(AuthScheme::Basic),
        digest: None,
    })
}

pub fn challenge(realm: &str) -> Response {
    let mut response =
        HttpError::new(StatusCode::UNAUTHORIZED, "authentication required").into_response();
    let value = HeaderValue::from_str(&format!("Basic realm=\"{realm}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("Basic"));
    response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
    response
}
