//! Text extraction backends.
//!
//! Extraction runs an external program against a file on disk and reads plain text from its
//! standard output. The default backend is `pdftotext -layout <file> -`; any tool with the same
//! shape can be configured instead.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Placeholder replaced by the input path inside extractor arguments.
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Errors raised while extracting text from a document.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Extractor program could not be started (usually missing from `PATH`).
    #[error("Failed to launch extractor '{program}': {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Extractor exited unsuccessfully.
    #[error("Extractor '{program}' exited with {status}: {stderr}")]
    Failed {
        /// Program that failed.
        program: String,
        /// Exit status description.
        status: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },
    /// Extractor did not finish within the configured bound.
    #[error("Extractor '{program}' timed out after {timeout:?}")]
    TimedOut {
        /// Program that was killed.
        program: String,
        /// Bound that elapsed.
        timeout: Duration,
    },
    /// Extractor succeeded but produced no text.
    #[error("Extractor produced no text")]
    NoText,
}

/// Interface implemented by extraction backends.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Convert the document at `path` into plain text.
    async fn extract(&self, path: &Path) -> Result<String, ExtractionError>;
}

/// Runs an external program and captures its standard output as the document text.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandExtractor {
    /// Build an extractor invoking `program` with `args`.
    ///
    /// Every argument equal to [`INPUT_PLACEHOLDER`] is replaced by the input path. When no
    /// argument carries the placeholder, the path is appended last.
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// The `pdftotext -layout <file> -` invocation.
    pub fn pdftotext(timeout: Duration) -> Self {
        Self::new(
            "pdftotext",
            vec!["-layout".into(), INPUT_PLACEHOLDER.into(), "-".into()],
            timeout,
        )
    }

    fn command(&self, path: &Path) -> Command {
        let mut command = Command::new(&self.program);
        let mut substituted = false;
        for arg in &self.args {
            if arg == INPUT_PLACEHOLDER {
                command.arg(path);
                substituted = true;
            } else {
                command.arg(arg);
            }
        }
        if !substituted {
            command.arg(path);
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl TextExtractor for CommandExtractor {
    async fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        tracing::debug!(program = %self.program, path = %path.display(), "Running extractor");
        let output = tokio::time::timeout(self.timeout, self.command(path).output())
            .await
            .map_err(|_| ExtractionError::TimedOut {
                program: self.program.clone(),
                timeout: self.timeout,
            })?
            .map_err(|source| ExtractionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExtractionError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: scrub_path(&String::from_utf8_lossy(&output.stderr), path),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        if text.trim().is_empty() {
            return Err(ExtractionError::NoText);
        }
        tracing::debug!(
            program = %self.program,
            characters = text.chars().count(),
            "Extraction finished"
        );
        Ok(text)
    }
}

/// Replace the server-side input path in tool output; error messages reach HTTP clients.
fn scrub_path(output: &str, path: &Path) -> String {
    let path = path.display().to_string();
    let trimmed = output.trim();
    if path.is_empty() {
        return trimmed.to_string();
    }
    trimmed.replace(&path, "<input>")
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::io::Write;

    fn fixture(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write fixture");
        file
    }

    #[tokio::test]
    async fn captures_stdout_as_text() {
        let file = fixture("Invoice total: $42\n");
        let extractor = CommandExtractor::new("cat", vec![], Duration::from_secs(5));

        let text = extractor.extract(file.path()).await.expect("text");
        assert_eq!(text, "Invoice total: $42\n");
    }

    #[tokio::test]
    async fn substitutes_input_placeholder() {
        let file = fixture("hello");
        let extractor = CommandExtractor::new(
            "cat",
            vec!["--".into(), INPUT_PLACEHOLDER.into()],
            Duration::from_secs(5),
        );

        assert_eq!(extractor.extract(file.path()).await.expect("text"), "hello");
    }

    #[tokio::test]
    async fn non_zero_exit_is_a_failure() {
        let file = fixture("ignored");
        let extractor = CommandExtractor::new("false", vec![], Duration::from_secs(5));

        let error = extractor.extract(file.path()).await.expect_err("failure");
        assert!(matches!(error, ExtractionError::Failed { .. }), "{error:?}");
    }

    #[tokio::test]
    async fn failure_stderr_does_not_leak_input_path() {
        let file = fixture("ignored");
        let extractor = CommandExtractor::new(
            "sh",
            vec![
                "-c".into(),
                "echo \"$0: broken document\" >&2; exit 1".into(),
                INPUT_PLACEHOLDER.into(),
            ],
            Duration::from_secs(5),
        );

        let error = extractor.extract(file.path()).await.expect_err("failure");
        let message = error.to_string();
        assert!(message.contains("<input>: broken document"), "{message}");
        assert!(!message.contains(&file.path().display().to_string()), "{message}");
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let file = fixture("ignored");
        let extractor = CommandExtractor::new(
            "docuwhiz-extractor-that-does-not-exist",
            vec![],
            Duration::from_secs(5),
        );

        let error = extractor.extract(file.path()).await.expect_err("failure");
        assert!(matches!(error, ExtractionError::Spawn { .. }), "{error:?}");
    }

    #[tokio::test]
    async fn blank_output_is_rejected() {
        let file = fixture("  \n\t\n");
        let extractor = CommandExtractor::new("cat", vec![], Duration::from_secs(5));

        let error = extractor.extract(file.path()).await.expect_err("failure");
        assert!(matches!(error, ExtractionError::NoText), "{error:?}");
    }

    #[tokio::test]
    async fn slow_extractor_times_out() {
        let extractor = CommandExtractor::new(
            "sh",
            vec!["-c".into(), "sleep 5".into(), INPUT_PLACEHOLDER.into()],
            Duration::from_millis(100),
        );

        let error = extractor
            .extract(Path::new("unused"))
            .await
            .expect_err("timeout");
        assert!(matches!(error, ExtractionError::TimedOut { .. }), "{error:?}");
    }
}
