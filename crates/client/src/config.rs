//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `C2C_API_BASE_URL` - Marketplace API base URL (default: the hosted API)
//! - `C2C_TOKEN_FILE` - Where the session token is persisted
//!   (default: `$HOME/.c2c/storage.json`)
//! - `C2C_HTTP_TIMEOUT_SECS` - Request timeout in seconds (default: 30)
//! - `C2C_ERROR_MESSAGE_FIELDS` - Comma-separated fields searched for a
//!   server error message, dotted for nesting (default:
//!   `message,error.message,error`)
//! - `C2C_SETTLEMENT_POLICY` - `last-settled` (default) or `latest-issued`

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::error::ErrorMessageMapping;
use crate::store::SettlementPolicy;

/// Hosted marketplace API.
pub const DEFAULT_API_BASE_URL: &str = "https://c2c-git-main-jeevacehs-projects.vercel.app/api";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Marketplace client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL; endpoint paths are appended to it.
    pub api_base_url: Url,
    /// File holding the persisted session token.
    pub token_file: PathBuf,
    /// Per-request timeout.
    pub http_timeout: Duration,
    /// How server error bodies are turned into messages.
    pub error_messages: ErrorMessageMapping,
    /// What happens when requests in one category overlap.
    pub settlement_policy: SettlementPolicy,
}

impl ClientConfig {
    /// Configuration with defaults for everything but the API base URL.
    #[must_use]
    pub fn new(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            token_file: default_token_file(),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            error_messages: ErrorMessageMapping::default(),
            settlement_policy: SettlementPolicy::default(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = get_env_or_default("C2C_API_BASE_URL", DEFAULT_API_BASE_URL)
            .parse::<Url>()
            .map_err(|e| ConfigError::InvalidEnvVar("C2C_API_BASE_URL".to_string(), e.to_string()))?;

        let token_file = get_optional_env("C2C_TOKEN_FILE").map_or_else(default_token_file, PathBuf::from);

        let timeout_secs = get_env_or_default("C2C_HTTP_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("C2C_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        let error_messages = get_optional_env("C2C_ERROR_MESSAGE_FIELDS")
            .map_or_else(ErrorMessageMapping::default, |fields| {
                ErrorMessageMapping::new(fields.split(',').map(str::trim).filter(|f| !f.is_empty()))
            });

        let settlement_policy = get_env_or_default("C2C_SETTLEMENT_POLICY", "last-settled")
            .parse::<SettlementPolicy>()
            .map_err(|e| ConfigError::InvalidEnvVar("C2C_SETTLEMENT_POLICY".to_string(), e))?;

        Ok(Self {
            api_base_url,
            token_file,
            http_timeout: Duration::from_secs(timeout_secs),
            error_messages,
            settlement_policy,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// `$HOME/.c2c/storage.json`, or relative to the working directory when
/// `HOME` is not set.
fn default_token_file() -> PathBuf {
    std::env::var_os("HOME")
        .map_or_else(PathBuf::new, PathBuf::from)
        .join(".c2c")
        .join("storage.json")
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
