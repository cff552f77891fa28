//! Session identifier strategies.

use std::path::Path;
use uuid::Uuid;

/// How a new upload is assigned its session identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionIdStrategy {
    /// Reuse the base name of the uploaded file. Re-uploading a file with the same name replaces
    /// the earlier session, including uploads from unrelated clients.
    FileName,
    /// Generate a fresh random token for every upload.
    #[default]
    Token,
}

impl SessionIdStrategy {
    /// Derive the identifier for an upload carrying the optional client-supplied `file_name`.
    pub fn assign(self, file_name: Option<&str>) -> String {
        match self {
            Self::FileName => file_name
                .and_then(base_name)
                .unwrap_or_else(generate_token),
            Self::Token => generate_token(),
        }
    }
}

impl std::str::FromStr for SessionIdStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "filename" | "file_name" => Ok(Self::FileName),
            "token" => Ok(Self::Token),
            _ => Err(()),
        }
    }
}

/// Strip directory components a client may have sent along with the file name.
pub(crate) fn base_name(raw: &str) -> Option<String> {
    let normalized = raw.replace('\\', "/");
    Path::new(&normalized)
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .map(str::to_string)
}

fn generate_token() -> String {
    Uuid::new_v4().to_string()
}
