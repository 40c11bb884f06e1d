//! Session configuration.

use crate::codec::TokenFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default cookie name.
pub const DEFAULT_COOKIE_NAME: &str = "sessionid";

/// Default idle timeout (20 minutes).
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(1200);

/// Cookie SameSite attribute
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    /// Sent only on same-site requests
    Strict,
    /// Also sent on top-level cross-site navigation
    #[default]
    Lax,
    /// Sent on all requests (requires `Secure`)
    None,
}

impl SameSite {
    /// Attribute value as written in `Set-Cookie`.
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "strict" => Some(SameSite::Strict),
            "lax" => Some(SameSite::Lax),
            "none" => Some(SameSite::None),
            _ => None,
        }
    }
}

/// Session configuration.
///
/// Built once at startup and validated by [`Engine::new`](crate::Engine::new),
/// which also fills in defaults for an empty cookie name, an empty path and a
/// zero idle timeout.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie name carrying the session token
    pub cookie_name: String,
    /// Cookie domain
    pub domain: Option<String>,
    /// Cookie path (must start with `/`)
    pub path: String,
    /// Cookie HttpOnly flag
    pub http_only: bool,
    /// Cookie Secure flag (HTTPS only)
    pub secure: bool,
    /// Cookie SameSite policy
    pub same_site: SameSite,
    /// Idle lifetime, applied to both the cookie and the stored session
    #[serde(with = "duration_secs")]
    pub idle_timeout: Duration,
    /// Token encryption key: 16, 24 or 32 bytes for AES-128/192/256
    pub key: String,
    /// Format used for newly issued tokens
    pub token_format: TokenFormat,
    /// Whether a successful read also extends the session lifetime
    pub refresh_on_read: bool,
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("cookie_name", &self.cookie_name)
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("http_only", &self.http_only)
            .field("secure", &self.secure)
            .field("same_site", &self.same_site)
            .field("idle_timeout", &self.idle_timeout)
            .field("key", &"<redacted>")
            .field("token_format", &self.token_format)
            .field("refresh_on_read", &self.refresh_on_read)
            .finish()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            domain: None,
            path: "/".to_string(),
            http_only: true,
            secure: false,
            same_site: SameSite::Lax,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            key: String::new(),
            token_format: TokenFormat::RandomIv,
            refresh_on_read: true,
        }
    }
}

impl SessionConfig {
    /// Create a configuration with the given encryption key.
    ///
    /// # Examples
    ///
    /// ```
    /// use tessera_session::SessionConfig;
    /// use std::time::Duration;
    ///
    /// let config = SessionConfig::new("0123456789abcdef")
    ///     .with_cookie_name("sid")
    ///     .with_idle_timeout(Duration::from_secs(600))
    ///     .with_secure(true);
    /// assert_eq!(config.cookie_name, "sid");
    /// ```
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables keep their default value.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(name) = std::env::var("SESSION_COOKIE_NAME") {
            config.cookie_name = name;
        }

        if let Ok(domain) = std::env::var("SESSION_COOKIE_DOMAIN") {
            config.domain = Some(domain);
        }

        if let Ok(path) = std::env::var("SESSION_COOKIE_PATH") {
            config.path = path;
        }

        if let Ok(secure) = std::env::var("SESSION_COOKIE_SECURE") {
            config.secure = parse_flag(&secure);
        }

        if let Ok(http_only) = std::env::var("SESSION_COOKIE_HTTP_ONLY") {
            config.http_only = parse_flag(&http_only);
        }

        if let Ok(same_site) = std::env::var("SESSION_COOKIE_SAME_SITE")
            && let Some(same_site) = SameSite::from_str(&same_site)
        {
            config.same_site = same_site;
        }

        if let Ok(timeout) = std::env::var("SESSION_IDLE_TIMEOUT")
            && let Ok(secs) = timeout.parse()
        {
            config.idle_timeout = Duration::from_secs(secs);
        }

        if let Ok(key) = std::env::var("SESSION_KEY") {
            config.key = key;
        }

        if let Ok(refresh) = std::env::var("SESSION_REFRESH_ON_READ") {
            config.refresh_on_read = parse_flag(&refresh);
        }

        config
    }

    /// Set the cookie name.
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Set the cookie domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Set the cookie path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the HttpOnly flag.
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Set the Secure flag.
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set the SameSite policy.
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    /// Set the idle timeout.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the token format for new cookies.
    pub fn with_token_format(mut self, format: TokenFormat) -> Self {
        self.token_format = format;
        self
    }

    /// Enable or disable lifetime refresh on reads.
    pub fn with_refresh_on_read(mut self, enabled: bool) -> Self {
        self.refresh_on_read = enabled;
        self
    }
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

pub(crate) mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
