// src/presentation/http/middleware/authenticate.rs
use crate::application::dto::{AuthenticatedUser, Credentials};
use crate::application::error::ApplicationError;
use crate::domain::identity::AuthScheme;
use crate::presentation::http::auth::{
    RoutePolicy, basic, challenge, digest, mint_session_id, session_cookie_header,
    session_id_from, split_authorization,
};
use crate::presentation::http::error::HttpError;
use crate::presentation::http::state::HttpState;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Per-request authentication and authorization for one route policy.
///
/// Usage:
/// `axum::middleware::from_fn(move |req, next| authenticate(req, next, policy.clone()))`
///
/// Order of business: session fast path, protocol discrimination, header
/// parse, credential verify, session bind, ability test. Every credential
/// failure collapses into the same challenge so callers cannot probe which
/// part failed.
pub async fn authenticate(req: Request<Body>, next: Next, policy: RoutePolicy) -> Response {
    let Some(state) = req.extensions().get::<HttpState>().cloned() else {
        return HttpError::from_error(ApplicationError::infrastructure(
            "application state missing",
        ))
        .into_response();
    };

    if state.config.auto_login() || policy.scheme == AuthScheme::None {
        return next.run(req).await;
    }

    // Fresh session identity short-circuits parsing and verification.
    let session_id = session_id_from(req.headers());
    if let Some(id) = &session_id {
        match state.services.sessions().load_identity(id).await {
            Ok(Some(username)) => {
                if let Some(user) = state.services.resolve_identity(&username) {
                    return authorize(req, next, &policy, user, None).await;
                }
                // The account disappeared since binding; fall through and
                // re-challenge.
            }
            Ok(None) => {}
            Err(err) => return HttpError::from_error(err).into_response(),
        }
    }

    let advertised = split_authorization(req.headers());
    if let Some((scheme, _)) = &advertised {
        if scheme != policy.scheme.as_str() {
            return HttpError::new(
                StatusCode::BAD_REQUEST,
                "access denied: wrong authentication protocol type",
            )
            .into_response();
        }
    }

    let credentials = match &advertised {
        Some((_, details)) => match parse_details(&state, &req, &policy, details) {
            Ok(credentials) => Some(credentials),
            Err(_) => return challenge(&state, policy.scheme),
        },
        None => None,
    };

    let Some(credentials) = credentials.filter(|c| !c.username.is_empty()) else {
        return challenge(&state, policy.scheme);
    };

    let user = match state.services.verifier().verify(&credentials).await {
        Ok(user) => user,
        Err(_) => return challenge(&state, policy.scheme),
    };

    let (session_id, minted) = match session_id {
        Some(id) => (id, false),
        None => (mint_session_id(), true),
    };
    if let Err(err) = state
        .services
        .sessions()
        .remember_identity(&session_id, &user.username)
        .await
    {
        return HttpError::from_error(err).into_response();
    }

    let set_cookie = minted.then(|| session_cookie_header(&session_id));
    authorize(req, next, &policy, user, set_cookie).await
}

fn parse_details(
    state: &HttpState,
    req: &Request<Body>,
    policy: &RoutePolicy,
    details: &str,
) -> Result<Credentials, ApplicationError> {
    match policy.scheme {
        AuthScheme::Basic => basic::parse(details)
            .ok_or_else(|| ApplicationError::unauthorized("invalid credentials")),
        AuthScheme::Digest => digest::parse(state, req.method(), details),
        // Form credentials arrive via the login action, never in a header.
        AuthScheme::Form | AuthScheme::None => {
            Err(ApplicationError::unauthorized("invalid credentials"))
        }
    }
}

/// The ability test, then the handler. The identity rides along in request
/// extensions for extractors downstream.
async fn authorize(
    mut req: Request<Body>,
    next: Next,
    policy: &RoutePolicy,
    user: AuthenticatedUser,
    set_cookie: Option<axum::http::HeaderValue>,
) -> Response {
    if !user.satisfies(&policy.required) {
        tracing::trace!(user = %user.username, "user is not authorized for access");
        return HttpError::new(
            StatusCode::FORBIDDEN,
            "access denied: user is not authorized for access",
        )
        .into_response();
    }
    req.extensions_mut().insert(user);
    let mut response = next.run(req).await;
    if let Some(cookie) = set_cookie {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}
