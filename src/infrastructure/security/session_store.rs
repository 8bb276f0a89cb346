// src/infrastructure/security/session_store.rs
use crate::application::ApplicationResult;
use crate::application::ports::{session::SessionStore, time::Clock};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct SessionEntry {
    vars: HashMap<String, String>,
    expires_at: DateTime<Utc>,
}

/// Session variables held in process memory, expiring a whole session after
/// the configured idle TTL. Access slides the expiry forward.
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, SessionEntry>>,
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::seconds(1800)),
            clock,
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str, key: &str) -> ApplicationResult<Option<String>> {
        let now = self.clock.now();
        let mut guard = self.sessions.lock().unwrap();
        let Some(entry) = guard.get_mut(session_id) else {
            return Ok(None);
        };
        if entry.expires_at < now {
            guard.remove(session_id);
            return Ok(None);
        }
        entry.expires_at = now + self.ttl;
        Ok(entry.vars.get(key).cloned())
    }

    async fn set(&self, session_id: &str, key: &str, value: &str) -> ApplicationResult<()> {
        let now = self.clock.now();
        let mut guard = self.sessions.lock().unwrap();
        let entry = guard
            .entry(session_id.to_string())
            .or_insert_with(|| SessionEntry {
                vars: HashMap::new(),
                expires_at: now + self.ttl,
            });
        entry.expires_at = now + self.ttl;
        entry.vars.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, session_id: &str, key: &str) -> ApplicationResult<()> {
        let mut guard = self.sessions.lock().unwrap();
        if let Some(entry) = guard.get_mut(session_id) {
            entry.vars.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct ManualClock(Mutex<DateTime<Utc>>);

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(Utc.timestamp_opt(1_000_000, 0).unwrap())))
        }

        fn advance(&self, secs: i64) {
            *self.0.lock().unwrap() += chrono::Duration::seconds(secs);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    #[tokio::test]
    async fn variables_round_trip_within_ttl() {
        let clock = ManualClock::new();
        let store = InMemorySessionStore::new(Duration::from_secs(60), clock.clone());
        store.set("sid", "auth.username", "alice").await.unwrap();
        clock.advance(59);
        assert_eq!(
            store.get("sid", "auth.username").await.unwrap().as_deref(),
            Some("alice")
        );
    }

    #[tokio::test]
    async fn idle_session_expires_wholesale() {
        let clock = ManualClock::new();
        let store = InMemorySessionStore::new(Duration::from_secs(60), clock.clone());
        store.set("sid", "auth.username", "alice").await.unwrap();
        store.set("sid", "referrer", "/dashboard").await.unwrap();
        clock.advance(61);
        assert_eq!(store.get("sid", "auth.username").await.unwrap(), None);
        assert_eq!(store.get("sid", "referrer").await.unwrap(), None);
        assert_eq!(store.session_count(), 0);
    }

    #[tokio::test]
    async fn access_slides_the_expiry() {
        let clock = ManualClock::new();
        let store = InMemorySessionStore::new(Duration::from_secs(60), clock.clone());
        store.set("sid", "auth.username", "alice").await.unwrap();
        clock.advance(45);
        assert!(store.get("sid", "auth.username").await.unwrap().is_some());
        clock.advance(45);
        // Still alive: the earlier read refreshed the deadline.
        assert!(store.get("sid", "auth.username").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn remove_clears_one_variable_only() {
        let clock = ManualClock::new();
        let store = InMemorySessionStore::new(Duration::from_secs(60), clock);
        store.set("sid", "auth.username", "alice").await.unwrap();
        store.set("sid", "referrer", "/dashboard").await.unwrap();
        store.remove("sid", "auth.username").await.unwrap();
        assert_eq!(store.get("sid", "auth.username").await.unwrap(), None);
        assert_eq!(
            store.get("sid", "referrer").await.unwrap().as_deref(),
            Some("/dashboard")
        );
    }
}
