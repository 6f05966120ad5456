use std::{env, path::PathBuf};

use secrecy::SecretString;

use crate::errors::{AppError, AppResult};

pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_QUIZ_MODEL: &str = "gpt-3.5-turbo-1106";
pub const DEFAULT_CACHE_DIR: &str = "./.cache/quiz_files";
pub const DEFAULT_WIKIPEDIA_API_URL: &str = "https://en.wikipedia.org/w/api.php";
pub const DEFAULT_CHUNK_SIZE_TOKENS: usize = 4000;
pub const MAX_WIKIPEDIA_RESULTS: usize = 5;
pub const DEFAULT_WIKIPEDIA_DOC_CHARS_MAX: usize = 4000;
/// 50 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Config {
    pub web_server_host: String,
    pub web_server_port: u16,
    pub openai_api_key: SecretString,
    pub openai_api_base: String,
    pub quiz_model: String,
    pub cache_dir: PathBuf,
    pub chunk_size_tokens: usize,
    pub chunk_overlap_tokens: usize,
    pub wikipedia_api_url: String,
    pub wikipedia_top_k: usize,
    pub wikipedia_doc_chars_max: usize,
    pub max_upload_bytes: usize,
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            web_server_port: parsed_or("WEB_SERVER_PORT", 8080),
            openai_api_key: SecretString::from(env::var("OPENAI_API_KEY").unwrap_or_default()),
            openai_api_base: env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| DEFAULT_OPENAI_API_BASE.to_string()),
            quiz_model: env::var("QUIZ_MODEL").unwrap_or_else(|_| DEFAULT_QUIZ_MODEL.to_string()),
            cache_dir: env::var("QUIZ_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CACHE_DIR)),
            chunk_size_tokens: parsed_or("CHUNK_SIZE_TOKENS", DEFAULT_CHUNK_SIZE_TOKENS),
            chunk_overlap_tokens: parsed_or("CHUNK_OVERLAP_TOKENS", 0),
            wikipedia_api_url: env::var("WIKIPEDIA_API_URL")
                .unwrap_or_else(|_| DEFAULT_WIKIPEDIA_API_URL.to_string()),
            wikipedia_top_k: parsed_or("WIKIPEDIA_TOP_K", MAX_WIKIPEDIA_RESULTS)
                .clamp(1, MAX_WIKIPEDIA_RESULTS),
            wikipedia_doc_chars_max: parsed_or(
                "WIKIPEDIA_DOC_CHARS_MAX",
                DEFAULT_WIKIPEDIA_DOC_CHARS_MAX,
            ),
            max_upload_bytes: parsed_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
        }
    }

    /// Validate that the settings needed to talk to the model service are present
    pub fn validate_for_production(&self) -> AppResult<()> {
        use secrecy::ExposeSecret;

        if self.openai_api_key.expose_secret().trim().is_empty() {
            return Err(AppError::ValidationError(
                "OPENAI_API_KEY is not set. Export it or add it to .env".to_string(),
            ));
        }

        if self.chunk_size_tokens == 0 {
            return Err(AppError::ValidationError(
                "CHUNK_SIZE_TOKENS must be greater than zero".to_string(),
            ));
        }

        if self.chunk_overlap_tokens >= self.chunk_size_tokens {
            return Err(AppError::ValidationError(format!(
                "CHUNK_OVERLAP_TOKENS ({}) must be smaller than CHUNK_SIZE_TOKENS ({})",
                self.chunk_overlap_tokens, self.chunk_size_tokens
            )));
        }

        Ok(())
    }

    pub fn test_config() -> Self {
        Self {
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
            openai_api_key: SecretString::from("sk-test".to_string()),
            openai_api_base: "http://127.0.0.1:1/v1".to_string(),
            quiz_model: DEFAULT_QUIZ_MODEL.to_string(),
            cache_dir: env::temp_dir().join("tento-quiz-test"),
            chunk_size_tokens: DEFAULT_CHUNK_SIZE_TOKENS,
            chunk_overlap_tokens: 0,
            wikipedia_api_url: "http://127.0.0.1:1/w/api.php".to_string(),
            wikipedia_top_k: MAX_WIKIPEDIA_RESULTS,
            wikipedia_doc_chars_max: DEFAULT_WIKIPEDIA_DOC_CHARS_MAX,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}
