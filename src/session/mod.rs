//! Session-scoped document context: identifiers and the shared text store.

pub mod id;
pub mod store;

pub use id::SessionIdStrategy;
pub use store::{SessionError, SessionStore};
