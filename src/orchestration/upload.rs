//! Upload orchestration: persist, extract, store, clean up.

use crate::extraction::{ExtractionError, TextExtractor};
use crate::orchestration::types::{DocumentUpload, UploadError, UploadOutcome};
use crate::session::{SessionError, SessionIdStrategy, SessionStore, id::base_name};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

/// Longest extension carried over to the transient file name.
const MAX_EXTENSION_LEN: usize = 16;

/// Turns uploaded documents into session records.
pub struct UploadOrchestrator {
    store: Arc<SessionStore>,
    extractor: Arc<dyn TextExtractor>,
    upload_dir: PathBuf,
    strategy: SessionIdStrategy,
}

impl UploadOrchestrator {
    /// Build an orchestrator writing transient files under `upload_dir`.
    pub fn new(
        store: Arc<SessionStore>,
        extractor: Arc<dyn TextExtractor>,
        upload_dir: impl Into<PathBuf>,
        strategy: SessionIdStrategy,
    ) -> Self {
        Self {
            store,
            extractor,
            upload_dir: upload_dir.into(),
            strategy,
        }
    }

    /// Store the text of `upload` under a new identifier chosen by the configured strategy.
    pub async fn upload(&self, upload: DocumentUpload) -> Result<UploadOutcome, UploadError> {
        let session_id = self.strategy.assign(upload.file_name.as_deref());
        self.upload_as(session_id, upload).await
    }

    /// Store the text of `upload` under `session_id`, replacing any earlier record.
    ///
    /// A blank identifier is rejected before anything touches disk. No record is written unless
    /// extraction succeeds. The transient file is removed whatever the extraction outcome;
    /// failing to remove it is logged and otherwise ignored.
    pub async fn upload_as(
        &self,
        session_id: String,
        upload: DocumentUpload,
    ) -> Result<UploadOutcome, UploadError> {
        if session_id.trim().is_empty() {
            return Err(SessionError::InvalidId.into());
        }
        let DocumentUpload { file_name, bytes } = upload;
        let display_name = file_name
            .as_deref()
            .and_then(base_name)
            .unwrap_or_else(|| "upload".to_string());
        let content_digest = hex::encode(Sha256::digest(&bytes));
        let path = self.transient_path(&display_name);

        self.persist(&path, &display_name, &bytes).await?;
        let extracted = self.extractor.extract(&path).await;
        remove_transient(&path).await;

        let text = extracted?;
        if text.trim().is_empty() {
            return Err(ExtractionError::NoText.into());
        }
        let characters = text.chars().count();
        self.store.put(&session_id, text)?;

        tracing::info!(
            session_id = %session_id,
            characters,
            bytes = bytes.len(),
            digest = %content_digest,
            "Document text stored"
        );
        Ok(UploadOutcome {
            session_id,
            characters,
            content_digest,
            uploaded_at: current_timestamp_rfc3339(),
        })
    }

    /// Random name keeping at most a short extension of the client's file name, so the
    /// extractor can still sniff the format and the name always fits `NAME_MAX`.
    fn transient_path(&self, file_name: &str) -> PathBuf {
        let token = Uuid::new_v4().simple().to_string();
        let name = match Path::new(file_name)
            .extension()
            .and_then(|extension| extension.to_str())
            .filter(|extension| {
                extension.len() <= MAX_EXTENSION_LEN
                    && extension.chars().all(|c| c.is_ascii_alphanumeric())
            }) {
            Some(extension) => format!("{token}.{extension}"),
            None => token,
        };
        self.upload_dir.join(name)
    }

    async fn persist(
        &self,
        path: &Path,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<(), UploadError> {
        let storage_error = |source: std::io::Error, target: &Path| {
            tracing::error!(path = %target.display(), error = %source, "Failed to persist upload");
            UploadError::Storage {
                file_name: file_name.to_string(),
                source,
            }
        };
        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|source| storage_error(source, &self.upload_dir))?;
        tokio::fs::write(path, bytes)
            .await
            .map_err(|source| storage_error(source, path))?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Upload persisted");
        Ok(())
    }
}

async fn remove_transient(path: &Path) {
    if let Err(error) = tokio::fs::remove_file(path).await {
        tracing::warn!(path = %path.display(), error = %error, "Failed to remove uploaded file");
    }
}

fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Reads the persisted file back, recording which paths it saw.
    #[derive(Default)]
    struct EchoExtractor {
        seen: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl TextExtractor for EchoExtractor {
        async fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
            self.seen.lock().unwrap().push(path.to_path_buf());
            Ok(tokio::fs::read_to_string(path).await.expect("persisted file"))
        }
    }

    struct FailingExtractor;

    #[async_trait]
    impl TextExtractor for FailingExtractor {
        async fn extract(&self, _path: &Path) -> Result<String, ExtractionError> {
            Err(ExtractionError::NoText)
        }
    }

    fn upload(name: &str, body: &str) -> DocumentUpload {
        DocumentUpload {
            file_name: Some(name.to_string()),
            bytes: body.as_bytes().to_vec(),
        }
    }

    #[tokio::test]
    async fn stores_extracted_text_and_removes_transient_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(SessionStore::new());
        let extractor = Arc::new(EchoExtractor::default());
        let orchestrator = UploadOrchestrator::new(
            store.clone(),
            extractor.clone(),
            dir.path().join("uploads"),
            SessionIdStrategy::FileName,
        );

        let outcome = orchestrator
            .upload(upload("invoice.pdf", "Invoice total: $42"))
            .await
            .expect("upload");

        assert_eq!(outcome.session_id, "invoice.pdf");
        assert_eq!(outcome.characters, 18);
        assert_eq!(outcome.content_digest.len(), 64);
        assert_eq!(&*store.get("invoice.pdf").expect("stored"), "Invoice total: $42");

        let seen = extractor.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].starts_with(dir.path().join("uploads")));
        assert!(!seen[0].exists(), "transient file should be removed");
    }

    #[tokio::test]
    async fn failed_extraction_writes_nothing_and_cleans_up() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(SessionStore::new());
        let orchestrator = UploadOrchestrator::new(
            store.clone(),
            Arc::new(FailingExtractor),
            dir.path(),
            SessionIdStrategy::FileName,
        );

        let error = orchestrator
            .upload(upload("broken.pdf", "garbage"))
            .await
            .expect_err("extraction failure");

        assert!(matches!(error, UploadError::Extraction(_)), "{error:?}");
        assert!(store.is_empty());
        let leftovers = std::fs::read_dir(dir.path()).expect("dir").count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn unwritable_upload_dir_is_a_storage_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").expect("blocker");
        let store = Arc::new(SessionStore::new());
        let orchestrator = UploadOrchestrator::new(
            store.clone(),
            Arc::new(EchoExtractor::default()),
            blocker.join("uploads"),
            SessionIdStrategy::Token,
        );

        let error = orchestrator
            .upload(upload("doc.txt", "text"))
            .await
            .expect_err("storage failure");

        assert!(matches!(error, UploadError::Storage { .. }), "{error:?}");
        assert!(store.is_empty());
        let message = error.to_string();
        assert!(message.contains("'doc.txt'"), "{message}");
        assert!(!message.contains(&dir.path().display().to_string()), "{message}");
    }

    #[tokio::test]
    async fn long_file_names_fit_the_transient_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let extractor = Arc::new(EchoExtractor::default());
        let orchestrator = UploadOrchestrator::new(
            Arc::new(SessionStore::new()),
            extractor.clone(),
            dir.path(),
            SessionIdStrategy::FileName,
        );
        let name = format!("{}.pdf", "a".repeat(240));

        let outcome = orchestrator
            .upload(upload(&name, "long name"))
            .await
            .expect("upload");

        assert_eq!(outcome.session_id, name);
        let seen = extractor.seen.lock().unwrap().clone();
        let transient = seen[0].file_name().and_then(|n| n.to_str()).expect("name");
        assert!(transient.len() <= 64, "{transient}");
        assert!(transient.ends_with(".pdf"), "{transient}");
    }

    #[tokio::test]
    async fn blank_identifier_is_rejected_before_any_io() {
        let dir = tempfile::tempdir().expect("tempdir");
        let upload_dir = dir.path().join("uploads");
        let extractor = Arc::new(EchoExtractor::default());
        let orchestrator = UploadOrchestrator::new(
            Arc::new(SessionStore::new()),
            extractor.clone(),
            upload_dir.clone(),
            SessionIdStrategy::Token,
        );

        let error = orchestrator
            .upload_as("  ".into(), upload("doc.txt", "text"))
            .await
            .expect_err("invalid id");

        assert!(
            matches!(error, UploadError::Session(SessionError::InvalidId)),
            "{error:?}"
        );
        assert!(extractor.seen.lock().unwrap().is_empty());
        assert!(!upload_dir.exists());
    }

    #[tokio::test]
    async fn reupload_under_same_identifier_replaces_text() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(SessionStore::new());
        let orchestrator = UploadOrchestrator::new(
            store.clone(),
            Arc::new(EchoExtractor::default()),
            dir.path(),
            SessionIdStrategy::Token,
        );

        orchestrator
            .upload_as("doc".into(), upload("a.txt", "v1"))
            .await
            .expect("first");
        orchestrator
            .upload_as("doc".into(), upload("b.txt", "v2"))
            .await
            .expect("second");

        assert_eq!(&*store.get("doc").expect("stored"), "v2");
    }

    #[tokio::test]
    async fn hostile_file_names_stay_inside_upload_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let extractor = Arc::new(EchoExtractor::default());
        let orchestrator = UploadOrchestrator::new(
            Arc::new(SessionStore::new()),
            extractor.clone(),
            dir.path(),
            SessionIdStrategy::FileName,
        );

        let outcome = orchestrator
            .upload(upload("../../escape.txt", "contained"))
            .await
            .expect("upload");

        assert_eq!(outcome.session_id, "escape.txt");
        let seen = extractor.seen.lock().unwrap().clone();
        assert_eq!(seen[0].parent(), Some(dir.path()));
    }
}
