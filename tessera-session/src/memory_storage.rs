//! In-memory session storage implementation.

use crate::error::{SessionError, SessionResult};
use crate::traits::{SessionStorage, storage_key};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Writes between two sweeps of expired sessions.
const PURGE_INTERVAL: usize = 256;

#[derive(Debug, Default)]
struct StoredSession {
    fields: HashMap<String, String>,
    expires_at: Option<DateTime<Utc>>,
}

impl StoredSession {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Process-local session store.
///
/// Useful for tests and single-instance deployments. Expiry is enforced
/// lazily: an expired session behaves as absent and is dropped the next
/// time its key is touched. Every 256 writes that create or
/// reuse a session also sweep all expired sessions, so abandoned sessions
/// do not accumulate. There is no background task.
#[derive(Debug)]
pub struct MemoryStorage {
    prefix: String,
    sessions: RwLock<HashMap<String, StoredSession>>,
    writes: AtomicUsize,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new("session")
    }
}

impl MemoryStorage {
    /// Create an empty store with the given key prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            sessions: RwLock::new(HashMap::new()),
            writes: AtomicUsize::new(0),
        }
    }

    /// Key prefix used for every session map.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Number of live (unexpired) sessions.
    pub fn len(&self) -> usize {
        let now = Utc::now();
        self.sessions
            .read()
            .values()
            .filter(|s| !s.is_expired(now))
            .count()
    }

    /// Whether no live session is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired session now. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        before - sessions.len()
    }

    /// Expiry currently recorded for a session, if any.
    pub fn expires_at(&self, session_id: &str) -> Option<DateTime<Utc>> {
        let key = storage_key(&self.prefix, session_id);
        self.sessions.read().get(&key).and_then(|s| s.expires_at)
    }

    /// Run `f` against the live session map for `key`, creating it if needed.
    fn with_session<T>(&self, session_id: &str, f: impl FnOnce(&mut StoredSession) -> T) -> T {
        let key = storage_key(&self.prefix, session_id);
        let now = Utc::now();
        let mut sessions = self.sessions.write();

        if self.writes.fetch_add(1, Ordering::Relaxed) % PURGE_INTERVAL == PURGE_INTERVAL - 1 {
            sessions.retain(|_, s| !s.is_expired(now));
        }

        let session = match sessions.entry(key) {
            Entry::Occupied(mut entry) => {
                if entry.get().is_expired(now) {
                    entry.insert(StoredSession::default());
                }
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(StoredSession::default()),
        };

        f(session)
    }

    /// Run `f` against the session map only if it is live.
    fn with_existing<T>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut StoredSession) -> T,
    ) -> Option<T> {
        let key = storage_key(&self.prefix, session_id);
        let now = Utc::now();
        let mut sessions = self.sessions.write();

        if sessions.get(&key).is_some_and(|s| s.is_expired(now)) {
            sessions.remove(&key);
            return None;
        }

        let result = sessions.get_mut(&key).map(f);

        // A map left without fields no longer exists, as in a hash store.
        if sessions.get(&key).is_some_and(|s| s.fields.is_empty()) {
            sessions.remove(&key);
        }

        result
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn add(&self, session_id: &str, field: &str, value: &str) -> SessionResult<()> {
        self.with_session(session_id, |session| match session.fields.entry(field.to_string()) {
            Entry::Occupied(_) => Err(SessionError::already_exists(field)),
            Entry::Vacant(entry) => {
                entry.insert(value.to_string());
                Ok(())
            }
        })
    }

    async fn put(&self, session_id: &str, field: &str, value: &str) -> SessionResult<()> {
        self.with_session(session_id, |session| {
            session.fields.insert(field.to_string(), value.to_string());
        });
        Ok(())
    }

    async fn update(&self, session_id: &str, field: &str, value: &str) -> SessionResult<()> {
        self.with_existing(session_id, |session| match session.fields.get_mut(field) {
            Some(current) => {
                *current = value.to_string();
                Ok(())
            }
            None => Err(SessionError::not_found(field)),
        })
        .unwrap_or_else(|| Err(SessionError::not_found(field)))
    }

    async fn get(&self, session_id: &str, field: &str) -> SessionResult<String> {
        self.with_existing(session_id, |session| session.fields.get(field).cloned())
            .flatten()
            .ok_or_else(|| SessionError::not_found(field))
    }

    async fn delete(&self, session_id: &str, field: &str) -> SessionResult<()> {
        self.with_existing(session_id, |session| {
            session.fields.remove(field);
        });
        Ok(())
    }

    async fn refresh(&self, session_id: &str, expires_at: DateTime<Utc>) -> SessionResult<()> {
        self.with_existing(session_id, |session| {
            session.expires_at = Some(expires_at);
        });
        Ok(())
    }

    async fn destroy(&self, session_id: &str) -> SessionResult<()> {
        let key = storage_key(&self.prefix, session_id);
        self.sessions.write().remove(&key);
        Ok(())
    }

    async fn exists(&self, session_id: &str) -> SessionResult<bool> {
        Ok(self.with_existing(session_id, |_| ()).is_some())
    }
}
