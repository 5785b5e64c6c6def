// Configuration Management
//
// This crate handles all configuration loading for the completion router.
// It provides:
// - Configuration structs and deserialization
// - File loading logic and environment overrides
// - Default configuration values
//
// Cross-references between models and providers are checked by the model
// registry in the services crate, not here.

use std::path::Path;
use thiserror::Error;

pub mod types;

// Re-export all configuration types
pub use types::*;

/// Environment variable that points at an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found. Tried paths: {paths}")]
    FileNotFound { paths: String },

    #[error("Failed to read configuration file: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {source}")]
    ParseError {
        #[from]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration loading interface
impl ApiConfig {
    /// Parse configuration from a YAML string
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ApiConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from `$CONFIG_PATH` or the default locations,
    /// then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load_from_file(path)?,
            Err(_) => {
                // Try different config locations in order
                let config_paths = ["config/config.yaml", "config.yaml", "config/default.yaml"];

                let found = config_paths.iter().find(|path| Path::new(path).exists());
                match found {
                    Some(path) => Self::load_from_file(path)?,
                    None => {
                        return Err(ConfigError::FileNotFound {
                            paths: config_paths.join(", "),
                        })
                    }
                }
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `SERVER_HOST`, `SERVER_PORT`, `LOG_LEVEL` and `LOG_FORMAT` overrides.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            self.server.port = port.parse().map_err(|_| {
                ConfigError::Invalid("SERVER_PORT must be a valid port number".to_string())
            })?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.format = format;
        }
        Ok(())
    }

    /// Shape checks that need no knowledge of the registered adapters
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (id, provider) in &self.providers {
            if provider.base_url.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "provider '{id}' has an empty base_url"
                )));
            }
            if provider.api_key_env.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "provider '{id}' has an empty api_key_env"
                )));
            }
            if provider.timeout_seconds == 0 {
                return Err(ConfigError::Invalid(format!(
                    "provider '{id}' must have a timeout_seconds greater than zero"
                )));
            }
        }

        for model in self.models.iter() {
            if model.name.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "model entries must have a non-empty name".to_string(),
                ));
            }
            if model.entry.default_params.max_tokens < 1 {
                return Err(ConfigError::Invalid(format!(
                    "model '{}' has default max_tokens below 1",
                    model.name
                )));
            }
            let temperature = model.entry.default_params.temperature;
            if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&temperature) {
                return Err(ConfigError::Invalid(format!(
                    "model '{}' has default temperature {temperature} outside [{MIN_TEMPERATURE}, {MAX_TEMPERATURE}]",
                    model.name
                )));
            }
        }

        Ok(())
    }
}
