//! Inputs, outcomes, and error definitions for the orchestrators.

use crate::extraction::ExtractionError;
use crate::generation::GenerationClientError;
use crate::session::SessionError;
use serde::Serialize;
use thiserror::Error;

/// Errors emitted while turning an upload into a session record.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Uploaded bytes could not be persisted for extraction.
    #[error("Failed to store uploaded file '{file_name}': {source}")]
    Storage {
        /// Name the client gave the file, or `upload` when it gave none.
        file_name: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Extractor failed or produced no text; nothing was stored.
    #[error("Failed to extract document text: {0}")]
    Extraction(#[from] ExtractionError),
    /// Session store refused the extracted text.
    #[error("Failed to store session record: {0}")]
    Session(#[from] SessionError),
}

/// Errors emitted while answering a chat turn.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Message was empty after trimming.
    #[error("Message must not be empty")]
    EmptyMessage,
    /// No successful upload exists for the session.
    #[error("No document text found for session '{0}'")]
    NoContext(String),
    /// Generation service failed, was unreachable, or answered with garbage.
    #[error("Generation request failed: {0}")]
    GenerationFailure(GenerationClientError),
    /// Generation service answered but offered no usable candidate.
    #[error("Generation service returned no answer")]
    EmptyGeneration,
}

impl From<GenerationClientError> for ChatError {
    fn from(error: GenerationClientError) -> Self {
        match error {
            GenerationClientError::Empty => Self::EmptyGeneration,
            other => Self::GenerationFailure(other),
        }
    }
}

/// A document received from a client.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    /// File name supplied by the client, if any.
    pub file_name: Option<String>,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

/// Summary of a completed upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    /// Identifier under which the extracted text is retrievable.
    pub session_id: String,
    /// Number of characters extracted.
    pub characters: usize,
    /// SHA-256 of the uploaded bytes, hex encoded.
    pub content_digest: String,
    /// RFC 3339 timestamp of when the record was stored.
    pub uploaded_at: String,
}
