//! Runtime configuration read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use flashcard_core::ReplyMode;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Settings for the outbound chat-completion call.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Provider credential. Generation fails with a configuration error when unset.
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
    pub reply_mode: ReplyMode,
    pub referer: String,
    pub title: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
            temperature: 0.7,
            max_tokens: 4000,
            reply_mode: ReplyMode::Strict,
            referer: "http://localhost:3000".to_string(),
            title: "Tutor App".to_string(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub upload_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub llm: LlmConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://data/tutor.db".to_string(),
            upload_dir: PathBuf::from("public/uploads"),
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_upload_bytes: 20 * 1024 * 1024,
            llm: LlmConfig::default(),
        }
    }
}

impl Config {
    /// Build configuration from environment variables.
    ///
    /// Recognized variables:
    /// - DATABASE_URL: SQLite URL (default `sqlite://data/tutor.db`)
    /// - UPLOAD_DIR: directory for uploaded images
    /// - HOST, PORT: listen address
    /// - MAX_UPLOAD_BYTES: request body limit for uploads
    /// - OPENROUTER_API_KEY: provider credential
    /// - OPENROUTER_BASE_URL: OpenAI-compatible API root
    /// - LLM_TIMEOUT_SECS, LLM_TEMPERATURE, LLM_MAX_TOKENS
    /// - LLM_LENIENT_JSON: accept prose around the reply object
    /// - APP_REFERER, APP_TITLE: attribution headers sent to the provider
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let llm = LlmConfig {
            api_key: env_opt("OPENROUTER_API_KEY"),
            base_url: env_opt("OPENROUTER_BASE_URL").unwrap_or(defaults.llm.base_url),
            timeout: env_parse("LLM_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.llm.timeout),
            temperature: env_parse("LLM_TEMPERATURE").unwrap_or(defaults.llm.temperature),
            max_tokens: env_parse("LLM_MAX_TOKENS").unwrap_or(defaults.llm.max_tokens),
            reply_mode: match env_parse::<bool>("LLM_LENIENT_JSON") {
                Some(true) => ReplyMode::Lenient,
                _ => ReplyMode::Strict,
            },
            referer: env_opt("APP_REFERER").unwrap_or(defaults.llm.referer),
            title: env_opt("APP_TITLE").unwrap_or(defaults.llm.title),
        };

        Self {
            database_url: env_opt("DATABASE_URL").unwrap_or(defaults.database_url),
            upload_dir: env_opt("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            host: env_opt("HOST").unwrap_or(defaults.host),
            port: env_parse("PORT").unwrap_or(defaults.port),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES").unwrap_or(defaults.max_upload_bytes),
            llm,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Non-empty value of an environment variable.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env_opt(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring unparseable {}={:?}", key, raw);
            None
        }
    }
}
