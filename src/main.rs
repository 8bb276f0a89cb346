// src/main.rs
use anyhow::Result;
use axum::Router;
use axum::routing::get;
use gatehouse_core::application::ports::{
    security::CredentialVerifier, session::SessionStore, time::Clock,
};
use gatehouse_core::application::services::AuthServices;
use gatehouse_core::config::AppConfig;
use gatehouse_core::domain::identity::{AuthScheme, Directory};
use gatehouse_core::infrastructure::{
    security::{
        nonce::NonceIssuer, session_store::InMemorySessionStore, verifier::LocalVerifier,
    },
    store::auth_file,
    time::SystemClock,
};
use gatehouse_core::presentation::http::{
    auth::{RoutePolicy, form::ActionRegistry},
    middleware::authenticate::authenticate,
    routes::{build_router, whoami},
    state::HttpState,
};
use std::{
    net::SocketAddr,
    sync::{Arc, RwLock},
};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    if let Err(err) = bootstrap().await {
        tracing::error!(error = %err, "fatal error");
        eprintln!("fatal error: {err}");
        std::process::exit(1);
    }
}

async fn bootstrap() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    if config.auto_login() {
        tracing::warn!(
            "auto-login is enabled: every request is admitted without authentication; \
             this is a development switch and must stay off in production"
        );
    }

    let mut directory = Directory::new(config.ability_max_depth());
    if let Some(path) = config.auth_file() {
        auth_file::load(&mut directory, path)?;
        tracing::info!(
            path = %path.display(),
            users = directory.user_count(),
            "authorization file loaded"
        );
    }
    let directory = Arc::new(RwLock::new(directory));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::default());
    let verifier: Arc<dyn CredentialVerifier> =
        Arc::new(LocalVerifier::new(Arc::clone(&directory), config.realm()));
    let session_store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(
        config.session_ttl(),
        Arc::clone(&clock),
    ));
    let services = Arc::new(AuthServices::new(
        directory,
        verifier,
        session_store,
        config.session_username_key(),
    ));
    let nonces = Arc::new(NonceIssuer::new(
        config.realm(),
        config.nonce_lifetime(),
        Arc::clone(&clock),
    ));

    let config = Arc::new(config);
    let state = HttpState {
        services,
        nonces,
        actions: Arc::new(ActionRegistry::new()),
        config: Arc::clone(&config),
    };

    let whoami_policy = RoutePolicy::new(AuthScheme::Form);
    let app_routes = Router::new().route(
        "/auth/whoami",
        get(whoami).layer(axum::middleware::from_fn(move |req, next| {
            authenticate(req, next, whoami_policy.clone())
        })),
    );
    let app = build_router(state, app_routes);

    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
    let address: SocketAddr = listener.local_addr()?;
    tracing::info!("listening on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .ok()
        .unwrap_or_else(|| "info,tower_http=info".to_string());

    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(env_filter))
        .with(tracing_subscriber::fmt::layer());

    if subscriber.try_init().is_err() {
        tracing::warn!("tracing subscriber already initialised");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install terminate handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
