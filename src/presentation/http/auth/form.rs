// src/presentation/http/auth/form.rs
//! In-process form actions: named handlers dispatched on
//! `POST /action/{name}` with the decoded form variables, the way an
//! embedded server runs "CGI" without a process. The auth core registers
//! `login` and `logout`; embedders may define more.

use crate::presentation::http::auth::{
    mint_session_id, session_cookie_header, session_id_from, split_authorization,
};
use crate::presentation::http::error::HttpError;
use crate::presentation::http::state::HttpState;
use axum::Extension;
use axum::extract::Path;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

pub type ActionFuture = Pin<Box<dyn Future<Output = Response> + Send>>;
pub type Action = Arc<dyn Fn(HttpState, ActionRequest) -> ActionFuture + Send + Sync>;

/// What an action sees of the request.
pub struct ActionRequest {
    pub session_id: Option<String>,
    /// Raw `Authorization` scheme token the client advertised, if any.
    pub advertised: Option<String>,
    vars: HashMap<String, String>,
}

impl ActionRequest {
    /// A decoded form variable, or `""` when absent.
    pub fn var(&self, name: &str) -> &str {
        self.vars.get(name).map(String::as_str).unwrap_or_default()
    }
}

/// Name → handler table for form actions.
#[derive(Default)]
pub struct ActionRegistry {
    actions: RwLock<HashMap<String, Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a named action.
    pub fn define(&self, name: impl Into<String>, action: Action) {
        self.actions.write().unwrap().insert(name.into(), action);
    }

    fn lookup(&self, name: &str) -> Option<Action> {
        self.actions.read().unwrap().get(name).cloned()
    }
}

/// Install the auth core's `login` and `logout` actions.
pub fn register_builtin_actions(registry: &ActionRegistry) {
    registry.define(
        "login",
        Arc::new(|state, request| -> ActionFuture { Box::pin(login_action(state, request)) }),
    );
    registry.define(
        "logout",
        Arc::new(|state, request| -> ActionFuture { Box::pin(logout_action(state, request)) }),
    );
}

/// `POST /action/{name}` handler.
pub async fn dispatch(
    Extension(state): Extension<HttpState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let Some(action) = state.actions.lookup(&name) else {
        return HttpError::new(StatusCode::NOT_FOUND, format!("form '{name}' is not defined"))
            .into_response();
    };

    let vars: HashMap<String, String> = serde_urlencoded::from_str(&body).unwrap_or_default();
    let request = ActionRequest {
        session_id: session_id_from(&headers),
        advertised: split_authorization(&headers).map(|(scheme, _)| scheme),
        vars,
    };
    action(state.clone(), request).await
}

async fn login_action(state: HttpState, request: ActionRequest) -> Response {
    let username = request.var("username").to_string();
    let password = request.var("password").to_string();

    let (session_id, minted) = match request.session_id {
        Some(id) => (id, false),
        None => (mint_session_id(), true),
    };

    match state.services.login_user(&session_id, &username, &password).await {
        Ok(user) => {
            tracing::debug!(user = %user.username, "form login succeeded");
            let referrer = state
                .services
                .sessions()
                .store()
                .get(&session_id, "referrer")
                .await
                .ok()
                .flatten();
            let mut response = match referrer {
                Some(target) => redirect_found(&target),
                None => StatusCode::OK.into_response(),
            };
            if minted {
                response
                    .headers_mut()
                    .append(header::SET_COOKIE, session_cookie_header(&session_id));
            }
            response
        }
        Err(_) => challenge(&state),
    }
}

async fn logout_action(state: HttpState, request: ActionRequest) -> Response {
    if let Some(session_id) = &request.session_id {
        if let Err(err) = state.services.logout_user(session_id).await {
            tracing::warn!(error = %err, "logout failed to clear session");
        }
    }
    match request.advertised.as_deref() {
        // Browser dialogs hold credentials; only a 401 makes them let go.
        Some("basic") | Some("digest") => {
            HttpError::new(StatusCode::UNAUTHORIZED, "logged out").into_response()
        }
        _ => StatusCode::OK.into_response(),
    }
}

fn redirect_found(location: &str) -> Response {
    let mut response = StatusCode::FOUND.into_response();
    if let Ok(value) = HeaderValue::from_str(location) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    response
}

/// Form routes have no header-time challenge; unauthenticated browsers go to
/// the embedder's login page when one is configured, else get a plain 401.
pub fn challenge(state: &HttpState) -> Response {
    match state.config.login_redirect() {
        Some(url) => redirect_found(url),
        None => HttpError::new(StatusCode::UNAUTHORIZED, "authentication required").into_response(),
    }
}
