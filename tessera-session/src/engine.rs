//! Session engine: configuration, token codec and storage behind one handle.

use crate::codec::{TokenCodec, fingerprint};
use crate::config::{DEFAULT_COOKIE_NAME, DEFAULT_IDLE_TIMEOUT, SessionConfig};
use crate::cookie::{SessionCookie, read_cookie, replace_cookie, set_cookie};
use crate::error::{CodecError, SessionError, SessionResult};
use crate::session::Session;
use crate::traits::{SessionStorage, generate_session_id};
use crate::value::FieldValue;
use chrono::{DateTime, Utc};
use http::HeaderMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Long-lived session engine.
///
/// Holds the validated configuration, the cookie token codec and the storage
/// adapter. Cheap to clone and safe to share across request handlers.
///
/// # Examples
///
/// ```
/// use tessera_session::{Engine, MemoryStorage, SessionConfig};
/// use http::HeaderMap;
///
/// # #[tokio::main]
/// # async fn main() -> tessera_session::SessionResult<()> {
/// let engine = Engine::new(SessionConfig::new("0123456789abcdef"), MemoryStorage::default())?;
///
/// let request = HeaderMap::new();
/// let mut response = HeaderMap::new();
/// let mut session = engine.use_session(&request, &mut response)?;
/// session.put("user", "alice").await?;
///
/// assert!(response.contains_key(http::header::SET_COOKIE));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Engine {
    config: Arc<SessionConfig>,
    codec: TokenCodec,
    idle_timeout: chrono::Duration,
    storage: Arc<dyn SessionStorage>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Validate `config` and build an engine over `storage`.
    ///
    /// An empty cookie name, an empty path and a zero idle timeout are
    /// replaced by their defaults, and a fractional idle timeout is rounded up
    /// to whole seconds. A cookie name with characters outside the cookie
    /// token set, a path not starting with `/`, an idle timeout too large to
    /// date a cookie with, or a key that is not 16, 24 or 32 bytes long is
    /// rejected with [`SessionError::Config`].
    pub fn new(config: SessionConfig, storage: impl SessionStorage + 'static) -> SessionResult<Self> {
        Self::with_storage(config, Arc::new(storage))
    }

    /// Like [`Engine::new`], over a shared storage adapter.
    pub fn with_storage(
        mut config: SessionConfig,
        storage: Arc<dyn SessionStorage>,
    ) -> SessionResult<Self> {
        if config.cookie_name.is_empty() {
            config.cookie_name = DEFAULT_COOKIE_NAME.to_string();
        }
        if !is_cookie_token(&config.cookie_name) {
            return Err(SessionError::Config(format!(
                "Invalid cookie name: {:?}",
                config.cookie_name
            )));
        }

        if config.path.is_empty() {
            config.path = "/".to_string();
        }
        if !config.path.starts_with('/') || !is_attribute_value(&config.path) {
            return Err(SessionError::Config(format!(
                "Invalid cookie path: {:?}",
                config.path
            )));
        }

        if config.domain.as_deref().is_some_and(str::is_empty) {
            config.domain = None;
        }
        if let Some(ref domain) = config.domain
            && !is_attribute_value(domain)
        {
            return Err(SessionError::Config(format!(
                "Invalid cookie domain: {:?}",
                domain
            )));
        }

        if config.idle_timeout.is_zero() {
            config.idle_timeout = DEFAULT_IDLE_TIMEOUT;
        }
        // Cookie Max-Age and store expiry both have one-second resolution.
        if config.idle_timeout.subsec_nanos() != 0 {
            let secs = config.idle_timeout.as_secs().saturating_add(1);
            config.idle_timeout = Duration::from_secs(secs);
        }
        let idle_timeout = chrono::Duration::from_std(config.idle_timeout)
            .ok()
            .filter(|timeout| Utc::now().checked_add_signed(*timeout).is_some())
            .ok_or_else(|| {
                SessionError::Config(format!(
                    "Idle timeout out of range: {}s",
                    config.idle_timeout.as_secs()
                ))
            })?;

        let codec = TokenCodec::new(config.key.as_bytes(), config.token_format).map_err(
            |e| match e {
                CodecError::InvalidKeyLength(_) => SessionError::Config(e.to_string()),
                other => SessionError::Codec(other),
            },
        )?;

        debug!(
            cookie_name = %config.cookie_name,
            idle_timeout_secs = config.idle_timeout.as_secs(),
            token_format = ?config.token_format,
            "Session engine configured"
        );

        Ok(Self {
            config: Arc::new(config),
            codec,
            idle_timeout,
            storage,
        })
    }

    /// Effective configuration, defaults applied.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Storage adapter.
    pub fn storage(&self) -> &dyn SessionStorage {
        self.storage.as_ref()
    }

    /// Cookie token codec.
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Absolute expiry for a session touched now.
    pub(crate) fn expires_from_now(&self) -> SessionResult<DateTime<Utc>> {
        Utc::now()
            .checked_add_signed(self.idle_timeout)
            .ok_or_else(|| SessionError::Config("Idle timeout overflows the calendar".to_string()))
    }

    /// Resolve the session for a request.
    ///
    /// A non-empty session cookie is decoded into its identifier; a cookie
    /// that fails to decode is an error and no new session is minted. A
    /// missing or empty cookie mints a fresh identifier and writes its cookie,
    /// valid for `idle_timeout`, to `response`. Storage is not touched.
    pub fn use_session<'r>(
        &self,
        request: &HeaderMap,
        response: &'r mut HeaderMap,
    ) -> SessionResult<Session<'_, 'r>> {
        if let Some(token) = read_cookie(request, &self.config.cookie_name)
            && !token.is_empty()
        {
            let id = self.decode_token(token)?;
            return Ok(Session::new(self, id, token.to_string(), false, response));
        }

        let id = generate_session_id();
        let token = self.codec.encode(&id)?;
        let expires_at = self.expires_from_now()?;
        set_cookie(
            response,
            &SessionCookie::new(&self.config, &token, expires_at),
        )?;

        debug!(token = fingerprint(&token), "Issued new session");

        Ok(Session::new(self, id, token, true, response))
    }

    /// Whether the request carries a cookie for a session that still has data.
    ///
    /// Never mints a session or writes a cookie.
    pub async fn verify_request(&self, request: &HeaderMap) -> SessionResult<bool> {
        match read_cookie(request, &self.config.cookie_name) {
            Some(token) if !token.is_empty() => self.verify_token(token).await,
            _ => Ok(false),
        }
    }

    /// Whether `token` decodes to a session that still has data.
    pub async fn verify_token(&self, token: &str) -> SessionResult<bool> {
        let id = self.decode_token(token)?;
        self.storage.exists(&id).await
    }

    /// Destroy the request's session and expire its cookie.
    ///
    /// Does nothing when the request carries no session cookie. Unlike
    /// [`Session::destroy`] this never mints a session first.
    pub async fn clear_all(&self, request: &HeaderMap, response: &mut HeaderMap) -> SessionResult<()> {
        let Some(token) = read_cookie(request, &self.config.cookie_name) else {
            return Ok(());
        };
        if token.is_empty() {
            return Ok(());
        }

        self.destroy_by_token(token).await?;
        replace_cookie(response, &SessionCookie::expired(&self.config))
    }

    /// Read a field of the session named by `token`, without refreshing it.
    pub async fn get_by_token(&self, token: &str, field: &str) -> FieldValue {
        match self.decode_token(token) {
            Ok(id) => FieldValue::from(self.storage.get(&id, field).await),
            Err(e) => FieldValue::from(Err(e)),
        }
    }

    /// Set a field of the session named by `token`.
    ///
    /// No cookie is written. The stored expiry is reset to
    /// `now + idle_timeout`, since the write may recreate a session that was
    /// destroyed or had expired.
    pub async fn put_by_token(&self, token: &str, field: &str, value: &str) -> SessionResult<()> {
        let id = self.decode_token(token)?;
        self.storage.put(&id, field, value).await?;
        self.storage.refresh(&id, self.expires_from_now()?).await
    }

    /// Remove a field of the session named by `token`, without refreshing it.
    pub async fn delete_by_token(&self, token: &str, field: &str) -> SessionResult<()> {
        let id = self.decode_token(token)?;
        self.storage.delete(&id, field).await
    }

    /// Delete all data of the session named by `token`.
    pub async fn destroy_by_token(&self, token: &str) -> SessionResult<()> {
        let id = self.decode_token(token)?;
        self.storage.destroy(&id).await?;

        info!(token = fingerprint(token), "Session destroyed");

        Ok(())
    }

    fn decode_token(&self, token: &str) -> SessionResult<String> {
        self.codec.decode(token).map_err(|e| {
            warn!(
                token = fingerprint(token),
                error = %e,
                "Rejected session token"
            );
            SessionError::Codec(e)
        })
    }
}

/// RFC 6265 cookie-name characters: visible ASCII minus separators.
fn is_cookie_token(name: &str) -> bool {
    name.bytes().all(|b| {
        b.is_ascii_graphic()
            && !matches!(
                b,
                b'(' | b')'
                    | b'<'
                    | b'>'
                    | b'@'
                    | b','
                    | b';'
                    | b':'
                    | b'\\'
                    | b'"'
                    | b'/'
                    | b'['
                    | b']'
                    | b'?'
                    | b'='
                    | b'{'
                    | b'}'
            )
    })
}

fn is_attribute_value(value: &str) -> bool {
    value.bytes().all(|b| b.is_ascii_graphic() && b != b';')
}
