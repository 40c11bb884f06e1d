// Tessera - cookie-identified server-side sessions
//
// This library ties an encrypted session cookie to a field map kept in a
// key-value store, with a sliding idle timeout shared by both.

// Re-export the session crate
pub use tessera_session::*;

// Prelude for common imports
pub mod prelude {
    pub use tessera_session::prelude::*;
}
