//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub cors_origin: String,
    pub llm_api_key: Option<String>,
    pub llm_base_url: String,
    pub note_model: String,
    pub daily_limit: u32,
    pub cooldown_seconds: u32,
    pub quota_daily_rollover: bool,
    pub history_path: PathBuf,
    pub export_path: PathBuf,
    pub max_upload_bytes: usize,
    pub session_idle_ttl_seconds: u64,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Server Settings ---
        let bind_address_str = var_or("BIND_ADDRESS", "0.0.0.0:3000");
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin = var_or("CORS_ORIGIN", "http://localhost:3000");

        // --- Completion Service Settings ---
        let llm_api_key = lookup("GROQ_API_KEY").filter(|key| !key.trim().is_empty());
        let llm_base_url = var_or("LLM_BASE_URL", "https://api.groq.com/openai/v1");
        let note_model = var_or("NOTE_MODEL", "llama-3.1-8b-instant");

        // --- Usage Limits ---
        let daily_limit = parse_var(&lookup, "DAILY_LIMIT", 20u32)?;
        let cooldown_seconds = parse_var(&lookup, "COOLDOWN_SECONDS", 5u32)?;
        let quota_daily_rollover = parse_var(&lookup, "QUOTA_DAILY_ROLLOVER", false)?;
        let session_idle_ttl_seconds = parse_var(&lookup, "SESSION_IDLE_TTL_SECONDS", 86_400u64)?;

        // --- Output Files ---
        let history_path = PathBuf::from(var_or("HISTORY_PATH", "data/history.txt"));
        let export_path = PathBuf::from(var_or("EXPORT_PATH", "downloads/AI_Notes.pdf"));
        let max_upload_bytes = parse_var(&lookup, "MAX_UPLOAD_BYTES", 10 * 1024 * 1024usize)?;

        Ok(Self {
            bind_address,
            log_level,
            cors_origin,
            llm_api_key,
            llm_base_url,
            note_model,
            daily_limit,
            cooldown_seconds,
            quota_daily_rollover,
            history_path,
            export_path,
            max_upload_bytes,
            session_idle_ttl_seconds,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
