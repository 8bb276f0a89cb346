// src/presentation/http/state.rs
use crate::application::services::AuthServices;
use crate::config::AppConfig;
use crate::infrastructure::security::nonce::NonceIssuer;
use crate::presentation::http::auth::form::ActionRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct HttpState {
    pub services: Arc<AuthServices>,
    pub nonces: Arc<NonceIssuer>,
    pub actions: Arc<ActionRegistry>,
    pub config: Arc<AppConfig>,
}
