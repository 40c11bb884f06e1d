//! Typed access to a session field read.

use crate::error::{SessionError, SessionResult};
use serde::de::DeserializeOwned;
use std::str::FromStr;

/// Outcome of reading one session field.
///
/// Carries either the stored string or the error the read produced, and
/// converts the string on demand.
///
/// # Examples
///
/// ```
/// use tessera_session::{FieldValue, SessionError};
///
/// let count = FieldValue::from(Ok("42".to_string()));
/// assert_eq!(count.as_i64().unwrap(), 42);
///
/// let missing = FieldValue::from(Err(SessionError::not_found("count")));
/// assert!(missing.is_not_found());
/// assert_eq!(missing.unwrap_or("0"), "0");
/// ```
#[derive(Debug)]
pub struct FieldValue {
    inner: SessionResult<String>,
}

impl From<SessionResult<String>> for FieldValue {
    fn from(inner: SessionResult<String>) -> Self {
        Self { inner }
    }
}

impl FieldValue {
    /// The error, if the read failed.
    pub fn err(&self) -> Option<&SessionError> {
        self.inner.as_ref().err()
    }

    /// Whether the field (or the whole session) was absent.
    pub fn is_not_found(&self) -> bool {
        self.err().is_some_and(SessionError::is_not_found)
    }

    /// Whether the read succeeded.
    pub fn is_ok(&self) -> bool {
        self.inner.is_ok()
    }

    /// Convert into the underlying result.
    pub fn into_result(self) -> SessionResult<String> {
        self.inner
    }

    /// Borrow the stored string.
    pub fn as_str(&self) -> SessionResult<&str> {
        match &self.inner {
            Ok(value) => Ok(value.as_str()),
            Err(e) => Err(e.clone()),
        }
    }

    /// The stored string, or `default` when the read failed.
    pub fn unwrap_or(self, default: &str) -> String {
        self.inner.unwrap_or_else(|_| default.to_string())
    }

    /// Parse the stored string with [`FromStr`].
    pub fn parse<T>(&self) -> SessionResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.as_str()?;
        raw.parse::<T>()
            .map_err(|e| SessionError::Parse(format!("{:?}: {}", raw, e)))
    }

    /// Parse as a signed integer.
    pub fn as_i64(&self) -> SessionResult<i64> {
        self.parse()
    }

    /// Parse as an unsigned integer.
    pub fn as_u64(&self) -> SessionResult<u64> {
        self.parse()
    }

    /// Parse as a float.
    pub fn as_f64(&self) -> SessionResult<f64> {
        self.parse()
    }

    /// Parse as a boolean (`1`/`0`/`true`/`false`, any case).
    pub fn as_bool(&self) -> SessionResult<bool> {
        let raw = self.as_str()?;
        match raw.to_ascii_lowercase().as_str() {
            "1" | "t" | "true" => Ok(true),
            "0" | "f" | "false" => Ok(false),
            _ => Err(SessionError::Parse(format!("{:?} is not a boolean", raw))),
        }
    }

    /// The stored string as bytes.
    pub fn as_bytes(&self) -> SessionResult<&[u8]> {
        self.as_str().map(str::as_bytes)
    }

    /// Split a delimited list and parse every element.
    pub fn split<T>(&self, sep: &str) -> SessionResult<Vec<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.as_str()?;
        if raw.is_empty() {
            return Ok(Vec::new());
        }
        raw.split(sep)
            .map(|part| {
                part.parse::<T>()
                    .map_err(|e| SessionError::Parse(format!("{:?}: {}", part, e)))
            })
            .collect()
    }

    /// Deserialize a JSON-encoded field.
    pub fn json<T: DeserializeOwned>(&self) -> SessionResult<T> {
        let raw = self.as_str()?;
        serde_json::from_str(raw).map_err(|e| SessionError::Deserialization(e.to_string()))
    }
}
