//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL every request path is appended to, including the `/api` prefix.
    pub api_base_url: String,
    /// Bearer token sent with every request, if configured.
    pub api_token: Option<String>,
    /// File holding the bearer token, read on each request when no token is set.
    pub token_path: Option<PathBuf>,
    pub request_timeout: Duration,
    pub log_level: Level,
    pub query_top_k: u32,
    pub history_page_size: u32,
    pub document_page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            api_token: None,
            token_path: None,
            request_timeout: Duration::from_millis(30_000),
            log_level: Level::INFO,
            query_top_k: 5,
            history_page_size: 50,
            document_page_size: 10,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_base_url = lookup("RAG_API_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "RAG_API_BASE_URL".to_string(),
                format!("'{}' is not an http(s) URL", api_base_url),
            ));
        }

        let api_token = lookup("RAG_API_TOKEN").filter(|t| !t.trim().is_empty());
        let token_path = lookup("RAG_TOKEN_PATH").map(PathBuf::from);

        let request_timeout = match lookup("RAG_REQUEST_TIMEOUT_MS") {
            Some(raw) => Duration::from_millis(parse_number("RAG_REQUEST_TIMEOUT_MS", &raw)?),
            None => defaults.request_timeout,
        };

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let query_top_k = lookup("RAG_QUERY_TOP_K")
            .map(|raw| parse_number("RAG_QUERY_TOP_K", &raw))
            .transpose()?
            .unwrap_or(defaults.query_top_k);
        let history_page_size = lookup("RAG_HISTORY_PAGE_SIZE")
            .map(|raw| parse_number("RAG_HISTORY_PAGE_SIZE", &raw))
            .transpose()?
            .unwrap_or(defaults.history_page_size);
        let document_page_size = lookup("RAG_DOCUMENT_PAGE_SIZE")
            .map(|raw| parse_number("RAG_DOCUMENT_PAGE_SIZE", &raw))
            .transpose()?
            .unwrap_or(defaults.document_page_size);

        Ok(Self {
            api_base_url,
            api_token,
            token_path,
            request_timeout,
            log_level,
            query_top_k,
            history_page_size,
            document_page_size,
        })
    }
}

/// Parses a strictly positive integer setting.
fn parse_number<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialEq + Default,
{
    match raw.trim().parse::<T>() {
        Ok(value) if value != T::default() => Ok(value),
        _ => Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("'{}' is not a positive integer", raw),
        )),
    }
}
