// src/presentation/http/routes.rs
use crate::presentation::http::auth::form;
use crate::presentation::http::extractors::Authenticated;
use crate::presentation::http::state::HttpState;
use axum::{Extension, Json, Router, routing::get, routing::post};
use serde::Serialize;
use tower_http::trace::TraceLayer;

/// Assemble the server router: the core's own surface (health, form
/// actions), the embedder's routes, then the shared layers. Routes that need
/// authentication arrive in `app_routes` already wrapped in an
/// `authenticate` layer; they must be merged here so the state extension
/// reaches them.
pub fn build_router(state: HttpState, app_routes: Router) -> Router {
    form::register_builtin_actions(&state.actions);

    Router::new()
        .merge(system_routes())
        .merge(action_routes())
        .merge(app_routes)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}

fn system_routes() -> Router {
    Router::new().route("/health", get(health))
}

fn action_routes() -> Router {
    Router::new().route("/action/{name}", post(form::dispatch))
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

pub async fn health() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".into(),
    })
}

#[derive(Debug, Serialize)]
pub struct WhoamiResponse {
    pub username: String,
    pub abilities: Vec<String>,
}

/// Identity echo for authenticated callers; handy behind any scheme.
pub async fn whoami(Authenticated(user): Authenticated) -> Json<WhoamiResponse> {
    let mut abilities: Vec<String> = user
        .abilities
        .iter()
        .map(|a| a.as_str().to_string())
        .collect();
    abilities.sort();
    Json(WhoamiResponse {
        username: user.username,
        abilities,
    })
}
