//! Configuration loading from file and environment variables.

use mouledi_nlu::{NluError, QueryRouter, RuleTables};
use mouledi_types::Coordinates;
use mouledi_voice::{FeedbackConfig, ServiceConfig, SessionConfig};
use serde::Deserialize;
use thiserror::Error;

/// Top-level configuration of the terminal host.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Backend URLs, timeouts and result limit.
    #[serde(default)]
    pub services: ServiceConfig,

    /// Session thresholds.
    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub feedback: FeedbackConfig,

    /// Fixed position reported to the session. Absent means "unknown".
    #[serde(default)]
    pub location: Option<Coordinates>,

    /// Replacement rule tables; absent fields keep the built-in ones.
    #[serde(default)]
    pub nlu: Option<RuleTables>,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Builds the query router from the `[nlu]` section.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Nlu` if a supplied rule table is invalid.
    pub fn router(&self) -> Result<QueryRouter, ConfigError> {
        let router = match &self.nlu {
            Some(tables) => tables.build_router()?,
            None => QueryRouter::default(),
        };
        Ok(router)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "mouledi_voice=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The `[nlu]` section holds an invalid rule table.
    #[error("invalid nlu rule tables: {0}")]
    Nlu(#[from] NluError),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `MOULEDI_API_URL` overrides `services.api_base_url`
/// - `MOULEDI_STT_URL` overrides `services.stt_base_url`
/// - `MOULEDI_LANGUAGE` overrides `feedback.language`
/// - `MOULEDI_LOG_LEVEL` overrides `logging.level`
/// - `MOULEDI_LOG_JSON` overrides `logging.json` (set to "true" or "1" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

/// Applies overrides from `lookup`, which maps a variable name to its value.
fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

    if let Some(url) = non_empty("MOULEDI_API_URL") {
        config.services.api_base_url = url;
    }
    if let Some(url) = non_empty("MOULEDI_STT_URL") {
        config.services.stt_base_url = url;
    }
    if let Some(language) = non_empty("MOULEDI_LANGUAGE") {
        config.feedback.language = language;
    }
    if let Some(level) = non_empty("MOULEDI_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("MOULEDI_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
}
