//! Session storage trait definition.

use crate::error::SessionResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Field-level storage for session data.
///
/// Every session owns one map of string fields stored under
/// `"<prefix>:<session id>"`, with a single expiry covering the whole map.
/// Implementations prefix keys themselves; callers only ever pass the bare
/// session identifier.
///
/// Every call is one round-trip to the backing store. Implementations do not
/// retry; failures and timeouts surface as [`SessionError::Transport`] or
/// [`SessionError::Timeout`].
///
/// [`SessionError::Transport`]: crate::SessionError::Transport
/// [`SessionError::Timeout`]: crate::SessionError::Timeout
///
/// # Examples
///
/// ```
/// use tessera_session::{MemoryStorage, SessionStorage};
///
/// # async fn example() -> tessera_session::SessionResult<()> {
/// let storage = MemoryStorage::new("myapp");
///
/// storage.add("sid-1", "user_id", "42").await?;
/// assert!(storage.add("sid-1", "user_id", "43").await.unwrap_err().is_already_exists());
/// assert_eq!(storage.get("sid-1", "user_id").await?, "42");
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Set a field only if it is absent.
    ///
    /// Fails with `AlreadyExists` when the field is already set.
    async fn add(&self, session_id: &str, field: &str, value: &str) -> SessionResult<()>;

    /// Set a field, replacing any previous value.
    async fn put(&self, session_id: &str, field: &str, value: &str) -> SessionResult<()>;

    /// Replace the value of an existing field.
    ///
    /// Fails with `NotFound` when the field does not exist.
    async fn update(&self, session_id: &str, field: &str, value: &str) -> SessionResult<()>;

    /// Read a field.
    ///
    /// Returns `NotFound` when the field or the whole session is absent.
    async fn get(&self, session_id: &str, field: &str) -> SessionResult<String>;

    /// Remove a field. Removing an absent field is not an error.
    async fn delete(&self, session_id: &str, field: &str) -> SessionResult<()>;

    /// Move the expiry of the whole session map to `expires_at`.
    async fn refresh(&self, session_id: &str, expires_at: DateTime<Utc>) -> SessionResult<()>;

    /// Remove the whole session map immediately.
    async fn destroy(&self, session_id: &str) -> SessionResult<()>;

    /// Check whether the session map exists and has not expired.
    async fn exists(&self, session_id: &str) -> SessionResult<bool>;
}

/// Generate a new unique session ID.
pub fn generate_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Build the namespaced key a session map is stored under.
pub fn storage_key(prefix: &str, session_id: &str) -> String {
    format!("{}:{}", prefix, session_id)
}
