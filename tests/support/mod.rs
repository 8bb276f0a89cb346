// tests/support/mod.rs
use axum::Router;
use axum::routing::get;
use chrono::{DateTime, TimeZone, Utc};
use gatehouse_core::application::ports::{
    security::CredentialVerifier, session::SessionStore, time::Clock,
};
use gatehouse_core::application::services::AuthServices;
use gatehouse_core::config::AppConfig;
use gatehouse_core::domain::identity::{AuthScheme, Directory};
use gatehouse_core::infrastructure::security::{
    ha1, nonce::NonceIssuer, session_store::InMemorySessionStore, verifier::LocalVerifier,
};
use gatehouse_core::presentation::http::auth::RoutePolicy;
use gatehouse_core::presentation::http::auth::form::ActionRegistry;
use gatehouse_core::presentation::http::middleware::authenticate::authenticate;
use gatehouse_core::presentation::http::routes::{build_router, whoami};
use gatehouse_core::presentation::http::state::HttpState;
use std::sync::{Arc, Mutex, RwLock};

pub const REALM: &str = "example.com";

/// Deterministic clock the tests wind forward by hand.
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self(Mutex::new(Utc.timestamp_opt(1_700_000_000, 0).unwrap())))
    }

    pub fn advance(&self, secs: i64) {
        *self.0.lock().unwrap() += chrono::Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

fn seeded_directory() -> Directory {
    let mut directory = Directory::default();
    directory
        .add_role("admin", vec!["manage".into(), "view".into()])
        .unwrap();
    directory
        .add_user("alice", ha1("alice", REALM, "secret"), "admin")
        .unwrap();
    directory
        .add_user("bob", ha1("bob", REALM, "secret"), "user")
        .unwrap();
    directory
}

pub struct TestHarness {
    pub router: Router,
    pub state: HttpState,
    pub clock: Arc<ManualClock>,
}

pub fn harness() -> TestHarness {
    harness_with_config(AppConfig::default().with_realm(REALM))
}

pub fn harness_with_config(config: AppConfig) -> TestHarness {
    let clock = ManualClock::new();
    let directory = Arc::new(RwLock::new(seeded_directory()));

    let verifier: Arc<dyn CredentialVerifier> =
        Arc::new(LocalVerifier::new(Arc::clone(&directory), config.realm()));
    let shared_clock: Arc<dyn Clock> = clock.clone();
    let session_store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(
        config.session_ttl(),
        Arc::clone(&shared_clock),
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
        shared_clock,
    ));

    let state = HttpState {
        services,
        nonces,
        actions: Arc::new(ActionRegistry::new()),
        config: Arc::new(config),
    };

    let router = build_router(state.clone(), protected_routes());
    TestHarness {
        router,
        state,
        clock,
    }
}

fn guarded(policy: RoutePolicy) -> axum::routing::MethodRouter {
    get(whoami).layer(axum::middleware::from_fn(move |req, next| {
        authenticate(req, next, policy.clone())
    }))
}

async fn open_handler() -> &'static str {
    "ok"
}

fn protected_routes() -> Router {
    let bypassed = RoutePolicy::new(AuthScheme::Basic).require("view");
    Router::new()
        .route(
            "/protected/basic",
            guarded(RoutePolicy::new(AuthScheme::Basic).require("view")),
        )
        .route(
            "/protected/deploy",
            guarded(RoutePolicy::new(AuthScheme::Basic).require("deploy")),
        )
        .route("/protected/digest", guarded(RoutePolicy::new(AuthScheme::Digest)))
        .route("/protected/form", guarded(RoutePolicy::new(AuthScheme::Form)))
        .route(
            "/protected/open",
            get(open_handler).layer(axum::middleware::from_fn(move |req, next| {
                authenticate(req, next, bypassed.clone())
            })),
        )
}
