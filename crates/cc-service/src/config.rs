//! Service configuration loaded from environment variables.

use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Default reconciliation interval for the session reaper (seconds).
const DEFAULT_REAPER_INTERVAL_SECONDS: u64 = 300;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string.
    pub database_url: String,

    /// Address the HTTP server binds to.
    pub bind_address: String,

    /// Base URL of the external video-session provider API.
    pub video_provider_url: String,

    /// Optional bearer key for the video provider.
    pub video_provider_api_key: Option<String>,

    /// Base URL of the external auth provider API (identity provisioning).
    pub auth_provider_url: String,

    /// Session reaper interval in seconds; 0 disables the reaper.
    pub reaper_interval_seconds: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = vars
            .get("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?
            .clone();

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| "0.0.0.0:8080".to_string());

        let video_provider_url = vars
            .get("VIDEO_PROVIDER_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("VIDEO_PROVIDER_URL".to_string()))?
            .clone();

        let video_provider_api_key = vars.get("VIDEO_PROVIDER_API_KEY").cloned();

        let auth_provider_url = vars
            .get("AUTH_PROVIDER_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("AUTH_PROVIDER_URL".to_string()))?
            .clone();

        let reaper_interval_seconds = match vars.get("REAPER_INTERVAL_SECONDS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue("REAPER_INTERVAL_SECONDS".to_string(), e.to_string())
            })?,
            None => DEFAULT_REAPER_INTERVAL_SECONDS,
        };

        Ok(Config {
            database_url,
            bind_address,
            video_provider_url,
            video_provider_api_key,
            auth_provider_url,
            reaper_interval_seconds,
        })
    }
}
