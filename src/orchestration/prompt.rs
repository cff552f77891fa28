//! Grounded prompt construction.

/// Instruction placed ahead of the document text.
pub const GROUNDING_INSTRUCTION: &str = "Answer based on this document:";

/// Compose the prompt sent to the generation service.
///
/// The order is fixed: instruction, then the full document, then the question. The model only
/// sees the document as context when it precedes the question.
pub fn build_grounded_prompt(document: &str, message: &str) -> String {
    format!("{GROUNDING_INSTRUCTION}\n\n{document}\n\nQuestion: {message}")
}
