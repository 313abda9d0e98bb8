//! Configuration management for the weather chat service.
//!
//! Configuration can be set via environment variables:
//! - `OPENAI_API_KEY` - OpenAI API key. Optional at startup; questions fail
//!   with a visible configuration message while it is absent.
//! - `OPENWEATHER_API_KEY` - OpenWeatherMap API key. Optional at startup;
//!   weather lookups fail with a visible configuration message while it is
//!   absent.
//! - `OPENAI_MODEL` - Optional. The chat model to use. Defaults to `gpt-4o-mini`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `3000`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// OpenAI API key, if configured
    pub openai_api_key: Option<String>,

    /// OpenWeatherMap API key, if configured
    pub weather_api_key: Option<String>,

    /// Chat model identifier
    pub model: String,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Missing provider keys are not an error here: their absence surfaces
    /// as a per-question configuration message rather than a startup crash.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `PORT` is not a valid port number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());

        let weather_api_key = std::env::var("OPENWEATHER_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());

        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        Ok(Self {
            openai_api_key,
            weather_api_key,
            model,
            host,
            port,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(openai_api_key: Option<String>, weather_api_key: Option<String>) -> Self {
        Self {
            openai_api_key,
            weather_api_key,
            model: "gpt-4o-mini".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}
