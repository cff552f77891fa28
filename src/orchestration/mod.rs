//! Upload and chat orchestration over the shared session store.

mod chat;
pub mod prompt;
mod service;
pub mod types;
mod upload;

pub use chat::ChatOrchestrator;
pub use prompt::build_grounded_prompt;
pub use service::{DocumentChatApi, DocumentChatService};
pub use types::{ChatError, DocumentUpload, UploadError, UploadOutcome};
pub use upload::UploadOrchestrator;
