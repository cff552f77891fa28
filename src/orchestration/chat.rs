//! Chat orchestration: resolve context, ground the prompt, generate.

use crate::generation::GenerationClient;
use crate::orchestration::prompt::build_grounded_prompt;
use crate::orchestration::types::ChatError;
use crate::session::SessionStore;
use std::sync::Arc;

/// Answers single questions against one session's document text.
pub struct ChatOrchestrator {
    store: Arc<SessionStore>,
    generator: Arc<dyn GenerationClient>,
}

impl ChatOrchestrator {
    /// Build an orchestrator reading from `store` and answering through `generator`.
    pub fn new(store: Arc<SessionStore>, generator: Arc<dyn GenerationClient>) -> Self {
        Self { store, generator }
    }

    /// Answer `message` using the document stored for `session_id`.
    ///
    /// The generation client is never called without document text.
    pub async fn chat(&self, session_id: &str, message: &str) -> Result<String, ChatError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        // `get` hands back an owned record; no store lock is held across the generation call.
        let document = self
            .store
            .get(session_id)
            .map_err(|_| ChatError::NoContext(session_id.to_string()))?;
        let prompt = build_grounded_prompt(&document, message);

        let answer = self.generator.generate(&prompt).await?;
        tracing::info!(
            session_id,
            prompt_chars = prompt.len(),
            answer_chars = answer.len(),
            "Chat turn answered"
        );
        Ok(answer)
    }
}
