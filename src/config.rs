// src/config.rs
use std::{env, path::PathBuf, time::Duration};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    listen_addr: String,
    realm: String,
    auto_login: bool,
    session_username_key: String,
    nonce_lifetime: Duration,
    ability_max_depth: usize,
    session_ttl: Duration,
    auth_file: Option<PathBuf>,
    server_url: String,
    login_redirect: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".into()
}

fn default_realm() -> String {
    "example.com".into()
}

fn default_session_username_key() -> String {
    "auth.username".into()
}

fn default_nonce_lifetime() -> u64 {
    300
}

fn default_session_ttl() -> u64 {
    1800
}

fn default_ability_max_depth() -> usize {
    20
}

impl AppConfig {
    /// Build configuration from environment variables. Uses sensible defaults
    /// for optional values and validates required keys.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Allow dotenv files to populate env vars when present.
        dotenvy::dotenv().ok();

        let listen_addr = env::var("LISTEN_ADDR").unwrap_or_else(|_| default_listen_addr());
        let realm = env::var("GATEHOUSE_REALM").unwrap_or_else(|_| default_realm());
        if realm.trim().is_empty() {
            return Err(ConfigError::Invalid("GATEHOUSE_REALM must not be empty".into()));
        }

        let auto_login = env::var("GATEHOUSE_AUTO_LOGIN")
            .ok()
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        let session_username_key = env::var("GATEHOUSE_SESSION_USERNAME_KEY")
            .unwrap_or_else(|_| default_session_username_key());

        let nonce_lifetime_secs = env::var("GATEHOUSE_NONCE_LIFETIME_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or_else(default_nonce_lifetime);

        let ability_max_depth = env::var("GATEHOUSE_ABILITY_MAX_DEPTH")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or_else(default_ability_max_depth);

        let session_ttl_secs = env::var("GATEHOUSE_SESSION_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or_else(default_session_ttl);

        let auth_file = env::var("GATEHOUSE_AUTH_FILE").ok().map(PathBuf::from);

        let server_url = env::var("GATEHOUSE_SERVER_URL")
            .unwrap_or_else(|_| format!("http://{listen_addr}"));

        let login_redirect = env::var("GATEHOUSE_LOGIN_REDIRECT").ok();

        Ok(Self {
            listen_addr,
            realm,
            auto_login,
            session_username_key,
            nonce_lifetime: Duration::from_secs(nonce_lifetime_secs),
            ability_max_depth,
            session_ttl: Duration::from_secs(session_ttl_secs),
            auth_file,
            server_url,
            login_redirect,
        })
    }

    pub fn listen_addr(&self) -> &str {
        &self.listen_addr
    }

    /// The protection-space name that appears in Basic/Digest challenges and
    /// is mixed into the HA1 hash.
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Development bypass: when set, every request is admitted without
    /// authentication. Never enable in production.
    pub fn auto_login(&self) -> bool {
        self.auto_login
    }

    pub fn session_username_key(&self) -> &str {
        &self.session_username_key
    }

    pub fn nonce_lifetime(&self) -> Duration {
        self.nonce_lifetime
    }

    pub fn ability_max_depth(&self) -> usize {
        self.ability_max_depth
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    pub fn auth_file(&self) -> Option<&PathBuf> {
        self.auth_file.as_ref()
    }

    /// Advertised in the Digest challenge's `domain` attribute.
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Where form-protected routes send unauthenticated browsers. `None`
    /// leaves them with a plain 401.
    pub fn login_redirect(&self) -> Option<&str> {
        self.login_redirect.as_deref()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            realm: default_realm(),
            auto_login: false,
            session_username_key: default_session_username_key(),
            nonce_lifetime: Duration::from_secs(default_nonce_lifetime()),
            ability_max_depth: default_ability_max_depth(),
            session_ttl: Duration::from_secs(default_session_ttl()),
            auth_file: None,
            server_url: format!("http://{}", default_listen_addr()),
            login_redirect: None,
        }
    }
}

/// Programmatic overrides for embedders (and tests) that do not configure
/// through the environment.
impl AppConfig {
    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = realm.into();
        self
    }

    /// Runtime switch for the development bypass. Leaving this on in a
    /// deployed server admits every request unauthenticated.
    pub fn with_auto_login(mut self, auto_login: bool) -> Self {
        self.auto_login = auto_login;
        self
    }

    pub fn with_nonce_lifetime(mut self, lifetime: Duration) -> Self {
        self.nonce_lifetime = lifetime;
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn with_login_redirect(mut self, url: impl Into<String>) -> Self {
        self.login_redirect = Some(url.into());
        self
    }

    pub fn with_auth_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.auth_file = Some(path.into());
        self
    }
}
