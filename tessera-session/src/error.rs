//! Error types for session operations.

use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Session-specific errors.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// Invalid engine configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed cookie token
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Field or session absent
    #[error("Session field not found: {field}")]
    NotFound {
        /// Field that was looked up
        field: String,
    },

    /// Field already set (write-once fields)
    #[error("Session field already exists: {field}")]
    AlreadyExists {
        /// Field that was already present
        field: String,
    },

    /// Backing store unreachable or rejected the command
    #[error("Transport error: {0}")]
    Transport(String),

    /// Backing store call exceeded its deadline
    #[error("Operation timeout")]
    Timeout,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Stored value could not be converted to the requested type
    #[error("Parse error: {0}")]
    Parse(String),
}

impl SessionError {
    /// Create a `NotFound` error for the given field.
    pub fn not_found(field: impl Into<String>) -> Self {
        Self::NotFound {
            field: field.into(),
        }
    }

    /// Create an `AlreadyExists` error for the given field.
    pub fn already_exists(field: impl Into<String>) -> Self {
        Self::AlreadyExists {
            field: field.into(),
        }
    }

    /// Check if this error means the field or session is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error is a rejected write-once `add`.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    /// Check if this error came from the backing store connection.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout)
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for SessionError {
    fn from(err: redis::RedisError) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for SessionError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Self::Timeout
    }
}

/// Cookie token encoding/decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Key is not 16, 24 or 32 bytes long
    #[error("Invalid key length: {0} (expected 16, 24 or 32 bytes)")]
    InvalidKeyLength(usize),

    /// Token is not valid hex
    #[error("Token is not valid hex")]
    InvalidHex,

    /// Ciphertext is empty or not a multiple of the block size
    #[error("Invalid ciphertext length: {0}")]
    InvalidLength(usize),

    /// Padding byte outside `[1, block size]`
    #[error("Invalid padding byte: {0}")]
    InvalidPadding(u8),

    /// Decrypted identifier is not UTF-8
    #[error("Decrypted identifier is not valid UTF-8")]
    InvalidUtf8,

    /// Token carries an unknown version tag
    #[error("Unsupported token version: {0}")]
    UnsupportedVersion(String),
}
