use crate::session::SessionIdStrategy;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-pro";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_EXTRACTOR_COMMAND: &str = "pdftotext";
const DEFAULT_EXTRACTOR_ARGS: &str = "-layout {input} -";
const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 60;
const DEFAULT_EXTRACTION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_SERVER_PORT: u16 = 8000;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the DocuWhiz server.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key passed to the Gemini generation endpoint.
    pub gemini_api_key: String,
    /// Gemini model identifier used for answers.
    pub gemini_model: String,
    /// Base URL of the generation service.
    pub gemini_base_url: String,
    /// Upper bound for a single generation request.
    pub generation_timeout: Duration,
    /// Program invoked to turn an uploaded file into text.
    pub extractor_command: String,
    /// Arguments for the extractor; `{input}` is replaced by the persisted file path.
    pub extractor_args: Vec<String>,
    /// Upper bound for a single extraction run.
    pub extraction_timeout: Duration,
    /// Directory where uploads are persisted while they are being extracted.
    pub upload_dir: PathBuf,
    /// Request body limit applied to the upload route.
    pub max_upload_bytes: usize,
    /// How session identifiers are derived for new uploads.
    pub session_id_strategy: SessionIdStrategy,
    /// Directory containing the compiled frontend.
    pub static_dir: PathBuf,
    /// Origin allowed by the CORS layer, when any.
    pub cors_allowed_origin: Option<String>,
    /// Port the HTTP server binds to.
    pub server_port: u16,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from `lookup`, which maps a variable name to its raw value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);
        Ok(Self {
            gemini_api_key: vars.required("GEMINI_API_KEY")?,
            gemini_model: vars
                .optional("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: vars
                .optional("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            generation_timeout: Duration::from_secs(
                vars.parse_or("GENERATION_TIMEOUT_SECS", DEFAULT_GENERATION_TIMEOUT_SECS)?,
            ),
            extractor_command: vars
                .optional("EXTRACTOR_COMMAND")
                .unwrap_or_else(|| DEFAULT_EXTRACTOR_COMMAND.to_string()),
            extractor_args: split_args(
                &vars
                    .optional("EXTRACTOR_ARGS")
                    .unwrap_or_else(|| DEFAULT_EXTRACTOR_ARGS.to_string()),
            ),
            extraction_timeout: Duration::from_secs(
                vars.parse_or("EXTRACTION_TIMEOUT_SECS", DEFAULT_EXTRACTION_TIMEOUT_SECS)?,
            ),
            upload_dir: vars
                .optional("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            max_upload_bytes: vars.parse_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            session_id_strategy: vars
                .optional("SESSION_ID_STRATEGY")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|()| ConfigError::InvalidValue("SESSION_ID_STRATEGY".into()))
                })
                .transpose()?
                .unwrap_or_default(),
            static_dir: vars
                .optional("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("dist")),
            // Set but empty disables CORS; unset falls back to the dev frontend origin.
            cors_allowed_origin: match (vars.0)("CORS_ALLOWED_ORIGIN") {
                Some(value) if value.trim().is_empty() => None,
                Some(value) => Some(value.trim().to_string()),
                None => Some(DEFAULT_CORS_ORIGIN.to_string()),
            },
            server_port: match vars.optional("SERVER_PORT") {
                Some(_) => vars.parse_or("SERVER_PORT", DEFAULT_SERVER_PORT)?,
                None => vars.parse_or("PORT", DEFAULT_SERVER_PORT)?,
            },
        })
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
    }

    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn parse_or<T: std::str::FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        self.optional(key)
            .map(|value| {
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue(key.to_string()))
            })
            .transpose()
            .map(|parsed| parsed.unwrap_or(default))
    }
}

fn split_args(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    if dotenvy::dotenv().is_err() {
        tracing::debug!("No .env file found; using process environment");
    }
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        model = %config.gemini_model,
        extractor = %config.extractor_command,
        upload_dir = %config.upload_dir.display(),
        server_port = config.server_port,
        session_id_strategy = ?config.session_id_strategy,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_the_api_key_is_set() {
        let config = load(&[("GEMINI_API_KEY", "key")]).expect("config");

        assert_eq!(config.gemini_model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.server_port, DEFAULT_SERVER_PORT);
        assert_eq!(config.session_id_strategy, SessionIdStrategy::Token);
        assert_eq!(config.cors_allowed_origin.as_deref(), Some(DEFAULT_CORS_ORIGIN));
        assert_eq!(config.extraction_timeout, Duration::from_secs(30));
    }

    #[test]
    fn missing_api_key_is_reported() {
        let error = load(&[("GEMINI_API_KEY", "  ")]).expect_err("missing key");
        assert!(
            matches!(&error, ConfigError::MissingVariable(key) if key == "GEMINI_API_KEY"),
            "{error:?}"
        );
    }

    #[test]
    fn unknown_session_id_strategy_is_invalid() {
        let error = load(&[("GEMINI_API_KEY", "key"), ("SESSION_ID_STRATEGY", "random")])
            .expect_err("invalid strategy");
        assert!(
            matches!(&error, ConfigError::InvalidValue(key) if key == "SESSION_ID_STRATEGY"),
            "{error:?}"
        );

        let config = load(&[("GEMINI_API_KEY", "key"), ("SESSION_ID_STRATEGY", "filename")])
            .expect("config");
        assert_eq!(config.session_id_strategy, SessionIdStrategy::FileName);
    }

    #[test]
    fn server_port_takes_precedence_over_port() {
        let config = load(&[
            ("GEMINI_API_KEY", "key"),
            ("SERVER_PORT", "9000"),
            ("PORT", "7000"),
        ])
        .expect("config");
        assert_eq!(config.server_port, 9000);

        let config = load(&[("GEMINI_API_KEY", "key"), ("PORT", "7000")]).expect("config");
        assert_eq!(config.server_port, 7000);

        let error = load(&[("GEMINI_API_KEY", "key"), ("SERVER_PORT", "eighty")])
            .expect_err("bad port");
        assert!(matches!(error, ConfigError::InvalidValue(_)), "{error:?}");
    }

    #[test]
    fn empty_cors_origin_disables_cors() {
        let config = load(&[("GEMINI_API_KEY", "key"), ("CORS_ALLOWED_ORIGIN", "")])
            .expect("config");
        assert_eq!(config.cors_allowed_origin, None);

        let config = load(&[
            ("GEMINI_API_KEY", "key"),
            ("CORS_ALLOWED_ORIGIN", " https://docs.example.com "),
        ])
        .expect("config");
        assert_eq!(
            config.cors_allowed_origin.as_deref(),
            Some("https://docs.example.com")
        );
    }

    #[test]
    fn splits_extractor_arguments_on_whitespace() {
        assert_eq!(
            split_args(" -layout  {input} -"),
            vec!["-layout".to_string(), "{input}".to_string(), "-".to_string()]
        );
        assert!(split_args("   ").is_empty());
    }

    #[test]
    fn default_extractor_arguments_read_stdout() {
        let args = split_args(DEFAULT_EXTRACTOR_ARGS);
        assert_eq!(args.last().map(String::as_str), Some("-"));
        assert!(args.iter().any(|arg| arg == "{input}"));
    }
}
