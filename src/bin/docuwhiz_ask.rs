//! One-shot question answering from the command line.
//!
//! Runs a document through the same extraction and chat pipeline as the HTTP server, without the
//! server: the file is extracted, stored under its session, and the question is answered once.
use anyhow::{Context, Result};
use clap::Parser;
use docuwhiz::{
    config, logging,
    orchestration::{DocumentChatService, DocumentUpload},
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "docuwhiz-ask",
    about = "Ask a single question about a document"
)]
struct Cli {
    /// Document to extract.
    document: PathBuf,
    /// Question to ask about the document.
    question: String,
    /// Print the extracted session identifier and digest before the answer.
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    config::init_config();
    logging::init_tracing();

    let bytes = tokio::fs::read(&cli.document)
        .await
        .with_context(|| format!("failed to read {}", cli.document.display()))?;
    let upload = DocumentUpload {
        file_name: cli
            .document
            .file_name()
            .map(|name| name.to_string_lossy().into_owned()),
        bytes,
    };

    let service =
        DocumentChatService::new().context("failed to initialize document chat service")?;
    let outcome = service
        .upload_document(upload)
        .await
        .context("failed to extract document")?;
    if cli.verbose {
        eprintln!(
            "session {} ({} characters, sha256 {})",
            outcome.session_id, outcome.characters, outcome.content_digest
        );
    }

    let answer = service
        .chat(&outcome.session_id, &cli.question)
        .await
        .context("failed to answer question")?;
    println!("{answer}");
    Ok(())
}
