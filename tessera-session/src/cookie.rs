//! Session cookie rendering and lookup over `http` header maps.

use crate::config::{SameSite, SessionConfig};
use crate::error::{SessionError, SessionResult};
use chrono::{DateTime, Utc};
use http::HeaderMap;
use http::header::{COOKIE, HeaderValue, SET_COOKIE};
use std::fmt;

/// A `Set-Cookie` entry for the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: String,
    pub expires: DateTime<Utc>,
    pub max_age: i64,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
}

impl SessionCookie {
    /// Cookie carrying `token` until `expires`.
    pub fn new(config: &SessionConfig, token: &str, expires: DateTime<Utc>) -> Self {
        Self {
            name: config.cookie_name.clone(),
            value: token.to_string(),
            domain: config.domain.clone(),
            path: config.path.clone(),
            expires,
            max_age: config.idle_timeout.as_secs() as i64,
            secure: config.secure,
            http_only: config.http_only,
            same_site: config.same_site,
        }
    }

    /// Empty cookie dated in the past, telling the client to drop it.
    pub fn expired(config: &SessionConfig) -> Self {
        let past = DateTime::<Utc>::from_timestamp(1, 0).unwrap_or(DateTime::UNIX_EPOCH);
        Self {
            max_age: 0,
            ..Self::new(config, "", past)
        }
    }

    fn header_value(&self) -> SessionResult<HeaderValue> {
        HeaderValue::from_str(&self.to_string())
            .map_err(|e| SessionError::Config(format!("Invalid cookie header: {}", e)))
    }
}

impl fmt::Display for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}; Path={}", self.name, self.value, self.path)?;

        if let Some(ref domain) = self.domain {
            write!(f, "; Domain={}", domain)?;
        }

        write!(
            f,
            "; Expires={}; Max-Age={}",
            self.expires.format("%a, %d %b %Y %H:%M:%S GMT"),
            self.max_age
        )?;

        if self.secure {
            f.write_str("; Secure")?;
        }

        if self.http_only {
            f.write_str("; HttpOnly")?;
        }

        write!(f, "; SameSite={}", self.same_site.as_str())
    }
}

/// Find the value of cookie `name` in the request's `Cookie` headers.
pub fn read_cookie<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
}

/// Whether a `Set-Cookie` for `name` has already been written.
pub fn has_set_cookie(headers: &HeaderMap, name: &str) -> bool {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .any(|value| is_cookie_named(value, name))
}

/// Append a `Set-Cookie` header.
pub fn set_cookie(headers: &mut HeaderMap, cookie: &SessionCookie) -> SessionResult<()> {
    headers.append(SET_COOKIE, cookie.header_value()?);
    Ok(())
}

/// Write `cookie`, dropping any `Set-Cookie` already written for its name.
pub fn replace_cookie(headers: &mut HeaderMap, cookie: &SessionCookie) -> SessionResult<()> {
    let value = cookie.header_value()?;
    let others: Vec<HeaderValue> = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter(|existing| !is_cookie_named(existing, &cookie.name))
        .cloned()
        .collect();

    headers.remove(SET_COOKIE);
    for other in others {
        headers.append(SET_COOKIE, other);
    }
    headers.append(SET_COOKIE, value);

    Ok(())
}

fn is_cookie_named(value: &HeaderValue, name: &str) -> bool {
    value
        .to_str()
        .ok()
        .and_then(|v| v.split_once('='))
        .is_some_and(|(key, _)| key.trim() == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    fn config() -> SessionConfig {
        SessionConfig::new("0123456789abcdef")
            .with_domain("example.com")
            .with_secure(true)
            .with_idle_timeout(Duration::from_secs(600))
    }

    #[test]
    fn test_cookie_rendering() {
        let expires = Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap();
        let cookie = SessionCookie::new(&config(), "abcdef", expires);

        assert_eq!(
            cookie.to_string(),
            "sessionid=abcdef; Path=/; Domain=example.com; \
             Expires=Wed, 02 Jan 2030 03:04:05 GMT; Max-Age=600; Secure; HttpOnly; SameSite=Lax"
        );
    }

    #[test]
    fn test_expired_cookie() {
        let cookie = SessionCookie::expired(&config());

        assert_eq!(cookie.value, "");
        assert_eq!(cookie.max_age, 0);
        assert!(cookie.expires < Utc::now());
        assert!(cookie.to_string().contains("Expires=Thu, 01 Jan 1970 00:00:01 GMT"));
    }

    #[test]
    fn test_read_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; sessionid=abc123"));
        headers.append(COOKIE, HeaderValue::from_static("other=1"));

        assert_eq!(read_cookie(&headers, "sessionid"), Some("abc123"));
        assert_eq!(read_cookie(&headers, "other"), Some("1"));
        assert_eq!(read_cookie(&headers, "session"), None);
    }

    #[test]
    fn test_read_empty_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("sessionid="));

        assert_eq!(read_cookie(&headers, "sessionid"), Some(""));
    }

    #[test]
    fn test_replace_keeps_unrelated_cookies() {
        let config = config();
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("csrf_token=xyz; Path=/"));
        set_cookie(&mut headers, &SessionCookie::new(&config, "abc", Utc::now())).unwrap();
        assert!(has_set_cookie(&headers, "sessionid"));

        replace_cookie(&mut headers, &SessionCookie::expired(&config)).unwrap();

        let values: Vec<&str> = headers
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(values.len(), 2);
        assert!(values[0].starts_with("csrf_token=xyz"));
        assert!(values[1].starts_with("sessionid=;"));
    }

    #[test]
    fn test_has_set_cookie_matches_exact_name() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("sessionid_v2=abc; Path=/"));

        assert!(!has_set_cookie(&headers, "sessionid"));
        assert!(has_set_cookie(&headers, "sessionid_v2"));
    }
}
