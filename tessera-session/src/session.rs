//! Per-request session handle.

use crate::codec::fingerprint;
use crate::cookie::{SessionCookie, has_set_cookie, replace_cookie, set_cookie};
use crate::engine::Engine;
use crate::error::{SessionError, SessionResult};
use crate::value::FieldValue;
use chrono::{DateTime, Utc};
use std::fmt;
use http::HeaderMap;
use serde::Serialize;
use tracing::{debug, info};

/// A session bound to one request/response pair.
///
/// Obtained from [`Engine::use_session`]. Every mutating call is forwarded to
/// storage and then extends the session lifetime, in storage and in the
/// cookie, to `now + idle_timeout`.
///
/// Two requests carrying the same cookie operate on the same field map;
/// concurrent writes to one field are last-write-wins, except [`add`] which
/// has exactly one winner.
///
/// [`add`]: Session::add
pub struct Session<'e, 'r> {
    engine: &'e Engine,
    id: String,
    token: String,
    is_new: bool,
    response: &'r mut HeaderMap,
}

impl fmt::Debug for Session<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &"<redacted>")
            .field("token", &fingerprint(&self.token))
            .field("is_new", &self.is_new)
            .finish_non_exhaustive()
    }
}

impl<'e, 'r> Session<'e, 'r> {
    pub(crate) fn new(
        engine: &'e Engine,
        id: String,
        token: String,
        is_new: bool,
        response: &'r mut HeaderMap,
    ) -> Self {
        Self {
            engine,
            id,
            token,
            is_new,
            response,
        }
    }

    /// Session identifier, for diagnostics only.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Cookie token carried by the client.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Whether this request minted the session.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Response headers the session writes its cookie into.
    pub fn response_headers(&self) -> &HeaderMap {
        self.response
    }

    /// Set a field only if absent; fails with `AlreadyExists` otherwise.
    pub async fn add(&mut self, field: &str, value: &str) -> SessionResult<()> {
        self.engine.storage().add(&self.id, field, value).await?;
        self.refresh().await
    }

    /// Set a field, creating or replacing it.
    pub async fn put(&mut self, field: &str, value: &str) -> SessionResult<()> {
        self.engine.storage().put(&self.id, field, value).await?;
        self.refresh().await
    }

    /// Replace an existing field; fails with `NotFound` if it is absent.
    pub async fn update(&mut self, field: &str, value: &str) -> SessionResult<()> {
        self.engine.storage().update(&self.id, field, value).await?;
        self.refresh().await
    }

    /// Remove a field. Removing an absent field succeeds.
    pub async fn delete(&mut self, field: &str) -> SessionResult<()> {
        self.engine.storage().delete(&self.id, field).await?;
        self.refresh().await
    }

    /// [`add`](Session::add) a JSON-encoded value.
    pub async fn add_json<T: Serialize + ?Sized>(
        &mut self,
        field: &str,
        value: &T,
    ) -> SessionResult<()> {
        let json = to_json(value)?;
        self.add(field, &json).await
    }

    /// [`put`](Session::put) a JSON-encoded value.
    pub async fn put_json<T: Serialize + ?Sized>(
        &mut self,
        field: &str,
        value: &T,
    ) -> SessionResult<()> {
        let json = to_json(value)?;
        self.put(field, &json).await
    }

    /// Read a field.
    ///
    /// With `refresh_on_read` enabled, a successful read also extends the
    /// session lifetime; a failed refresh is reported through the result.
    pub async fn get(&mut self, field: &str) -> FieldValue {
        let value = self.engine.storage().get(&self.id, field).await;

        if value.is_ok()
            && self.engine.config().refresh_on_read
            && let Err(e) = self.refresh().await
        {
            return FieldValue::from(Err(e));
        }

        FieldValue::from(value)
    }

    /// Extend the session lifetime to `now + idle_timeout`.
    ///
    /// The cookie is rewritten only if this response carries no `Set-Cookie`
    /// for it yet. Cookie and storage are not updated atomically: a storage
    /// failure after the cookie write leaves the cookie outliving the data.
    pub async fn refresh(&mut self) -> SessionResult<()> {
        let expires_at = self.engine.expires_from_now()?;
        self.write_cookie(expires_at)?;

        debug!(
            token = fingerprint(&self.token),
            expires_at = %expires_at,
            "Refreshing session"
        );

        self.engine.storage().refresh(&self.id, expires_at).await
    }

    /// Delete all session data and expire the cookie.
    ///
    /// Consumes the handle; a later request presenting the old cookie finds
    /// no data, and a request without cookie mints a new identifier.
    pub async fn destroy(self) -> SessionResult<()> {
        self.engine.storage().destroy(&self.id).await?;
        replace_cookie(self.response, &SessionCookie::expired(self.engine.config()))?;

        info!(token = fingerprint(&self.token), "Session destroyed");

        Ok(())
    }

    fn write_cookie(&mut self, expires_at: DateTime<Utc>) -> SessionResult<()> {
        let config = self.engine.config();
        if has_set_cookie(self.response, &config.cookie_name) {
            return Ok(());
        }
        set_cookie(
            self.response,
            &SessionCookie::new(config, &self.token, expires_at),
        )
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> SessionResult<String> {
    serde_json::to_string(value).map_err(|e| SessionError::Serialization(e.to_string()))
}
