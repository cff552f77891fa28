//! Service facade combining the orchestrators, shared store, and metrics.

use crate::{
    config::{Config, get_config},
    extraction::{CommandExtractor, TextExtractor},
    generation::{GeminiClient, GenerationClient, GenerationClientError},
    metrics::{ChatMetrics, MetricsSnapshot},
    orchestration::{
        chat::ChatOrchestrator,
        types::{ChatError, DocumentUpload, UploadError, UploadOutcome},
        upload::UploadOrchestrator,
    },
    session::{SessionIdStrategy, SessionStore},
};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// Owns the session store and both orchestrators.
///
/// Construct once near process start and share through an `Arc`; the HTTP surface and the CLI
/// both go through the same instance.
pub struct DocumentChatService {
    store: Arc<SessionStore>,
    uploads: UploadOrchestrator,
    chats: ChatOrchestrator,
    metrics: ChatMetrics,
}

/// Abstraction over the document chat pipeline used by external surfaces.
#[async_trait]
pub trait DocumentChatApi: Send + Sync {
    /// Extract and store an uploaded document, returning its session identifier.
    async fn upload_document(&self, upload: DocumentUpload) -> Result<UploadOutcome, UploadError>;

    /// Answer a question grounded in a previously uploaded document.
    async fn chat(&self, session_id: &str, message: &str) -> Result<String, ChatError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl DocumentChatService {
    /// Build the service from the global configuration.
    pub fn new() -> Result<Self, GenerationClientError> {
        Self::from_config(get_config())
    }

    /// Build the service from an explicit configuration.
    pub fn from_config(config: &Config) -> Result<Self, GenerationClientError> {
        tracing::info!(model = %config.gemini_model, "Initializing generation client");
        let generator = GeminiClient::new(
            config.gemini_base_url.clone(),
            config.gemini_model.clone(),
            config.gemini_api_key.clone(),
            config.generation_timeout,
        )?;
        let extractor = CommandExtractor::new(
            config.extractor_command.clone(),
            config.extractor_args.clone(),
            config.extraction_timeout,
        );
        Ok(Self::with_components(
            Arc::new(extractor),
            Arc::new(generator),
            config.upload_dir.clone(),
            config.session_id_strategy,
        ))
    }

    /// Assemble the service from explicit collaborators.
    pub fn with_components(
        extractor: Arc<dyn TextExtractor>,
        generator: Arc<dyn GenerationClient>,
        upload_dir: PathBuf,
        strategy: SessionIdStrategy,
    ) -> Self {
        let store = Arc::new(SessionStore::new());
        Self {
            uploads: UploadOrchestrator::new(store.clone(), extractor, upload_dir, strategy),
            chats: ChatOrchestrator::new(store.clone(), generator),
            store,
            metrics: ChatMetrics::new(),
        }
    }

    /// Extract and store an uploaded document.
    pub async fn upload_document(
        &self,
        upload: DocumentUpload,
    ) -> Result<UploadOutcome, UploadError> {
        let result = self.uploads.upload(upload).await;
        self.metrics.record_upload(result.is_ok());
        if let Err(error) = &result {
            tracing::warn!(error = %error, "Upload failed");
        }
        result
    }

    /// Extract and store a document under a caller-chosen identifier.
    pub async fn upload_document_as(
        &self,
        session_id: String,
        upload: DocumentUpload,
    ) -> Result<UploadOutcome, UploadError> {
        let result = self.uploads.upload_as(session_id, upload).await;
        self.metrics.record_upload(result.is_ok());
        if let Err(error) = &result {
            tracing::warn!(error = %error, "Upload failed");
        }
        result
    }

    /// Answer a question about the document stored for `session_id`.
    pub async fn chat(&self, session_id: &str, message: &str) -> Result<String, ChatError> {
        let result = self.chats.chat(session_id, message).await;
        self.metrics.record_chat(result.is_ok());
        if let Err(error) = &result {
            tracing::warn!(session_id, error = %error, "Chat turn failed");
        }
        result
    }

    /// Return the current metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.store.len())
    }
}

#[async_trait]
impl DocumentChatApi for DocumentChatService {
    async fn upload_document(&self, upload: DocumentUpload) -> Result<UploadOutcome, UploadError> {
        DocumentChatService::upload_document(self, upload).await
    }

    async fn chat(&self, session_id: &str, message: &str) -> Result<String, ChatError> {
        DocumentChatService::chat(self, session_id, message).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        DocumentChatService::metrics_snapshot(self)
    }
}
