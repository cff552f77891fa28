//! Concurrency-safe mapping from session identifier to extracted document text.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

/// Errors returned by [`SessionStore`] operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// No text is stored for the identifier.
    #[error("No document text stored for session '{0}'")]
    NotFound(String),
    /// Identifier was blank.
    #[error("Session identifier must not be empty")]
    InvalidId,
    /// Text was empty; records only exist for successful extractions.
    #[error("Refusing to store empty document text for session '{0}'")]
    EmptyText(String),
}

/// Owns every session record for the lifetime of the process.
///
/// The map is only reachable through [`SessionStore::put`] and [`SessionStore::get`]. Each
/// record is an immutable `Arc<str>`, so a write swaps the whole value under the write lock and
/// a reader either sees the previous record or the new one. The lock is held only for the map
/// operation itself; callers perform their I/O before `put` and after `get`.
#[derive(Debug, Default)]
pub struct SessionStore {
    records: RwLock<HashMap<String, Arc<str>>>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the text stored under `id`.
    ///
    /// Concurrent writers for the same identifier are ordered by lock acquisition; the last one
    /// to acquire the lock wins and its text is stored whole.
    pub fn put(&self, id: &str, text: impl Into<Arc<str>>) -> Result<(), SessionError> {
        if id.trim().is_empty() {
            return Err(SessionError::InvalidId);
        }
        let text = text.into();
        if text.is_empty() {
            return Err(SessionError::EmptyText(id.to_string()));
        }

        let replaced = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), text)
            .is_some();
        tracing::debug!(session_id = id, replaced, "Session record stored");
        Ok(())
    }

    /// Return the text currently stored under `id`.
    pub fn get(&self, id: &str) -> Result<Arc<str>, SessionError> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .filter(|text| !text.is_empty())
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    /// Number of sessions currently holding text.
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no session has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
