//! Cookie-identified server-side sessions.
//!
//! A session is a flat map of string fields kept in a key-value store and
//! identified by a random identifier. The identifier travels to the client
//! AES-CBC encrypted and hex encoded in a cookie; every write extends both
//! the cookie and the stored data to `now + idle_timeout`.
//!
//! # Features
//!
//! - `redis` - Redis hash storage (enabled by default)
//!
//! An in-process [`MemoryStorage`] is always available.
//!
//! # Token formats
//!
//! New cookies use a random IV per token (`v2.<hex(iv || ciphertext)>`).
//! Tokens in the legacy format, where the IV is the first 16 key bytes and
//! equal identifiers always yield equal tokens, are still accepted when
//! decoding and can be issued with [`TokenFormat::Legacy`].
//!
//! # Examples
//!
//! ```no_run
//! use tessera_session::prelude::*;
//! use http::HeaderMap;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SessionError> {
//!     let storage = RedisStorage::new(RedisStorageConfig::from_env())?;
//!     let engine = Engine::new(SessionConfig::from_env(), storage)?;
//!
//!     // Per request
//!     let request = HeaderMap::new();
//!     let mut response = HeaderMap::new();
//!     let mut session = engine.use_session(&request, &mut response)?;
//!
//!     session.put("user_id", "123").await?;
//!     let user_id = session.get("user_id").await.as_i64()?;
//!     println!("User ID: {}", user_id);
//!
//!     // Logout
//!     session.destroy().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod cookie;
pub mod engine;
pub mod error;
pub mod memory_storage;
pub mod session;
pub mod traits;
pub mod value;

#[cfg(feature = "redis")]
pub mod redis_storage;

pub use codec::{TokenCodec, TokenFormat};
pub use config::{SameSite, SessionConfig};
pub use cookie::SessionCookie;
pub use engine::Engine;
pub use error::{CodecError, SessionError, SessionResult};
pub use memory_storage::MemoryStorage;
pub use session::Session;
pub use traits::{SessionStorage, generate_session_id};
pub use value::FieldValue;

#[cfg(feature = "redis")]
pub use redis_storage::{RedisStorage, RedisStorageConfig};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::codec::TokenFormat;
    pub use crate::config::{SameSite, SessionConfig};
    pub use crate::engine::Engine;
    pub use crate::error::{SessionError, SessionResult};
    pub use crate::memory_storage::MemoryStorage;
    pub use crate::session::Session;
    pub use crate::traits::SessionStorage;
    pub use crate::value::FieldValue;

    #[cfg(feature = "redis")]
    pub use crate::redis_storage::{RedisStorage, RedisStorageConfig};
}
