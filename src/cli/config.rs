//! Configuration management for Clinassist
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.clinassist/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{ClinicalError, Result};
use crate::quota::QuotaConfig;
use crate::ranking::RankingConfig;
use crate::resilience::types::MAX_RETRIES_LIMIT;
use crate::resilience::ResilienceConfig;

/// Complete configuration for Clinassist
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub quota: QuotaConfig,
    pub resilience: ResilienceConfig,
    pub ranking: RankingConfig,
    pub paths: PathsConfig,
}

/// File system paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub state_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state_dir: "~/.clinassist".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(config_path) => Self::load_from_file(&config_path),
            None => Self::load_default(),
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ClinicalError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ClinicalError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from the standard location, or built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".clinassist").join("config.toml");
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.quota.daily_limit == 0 {
            return Err(ClinicalError::ConfigError(
                "quota.daily_limit must be greater than 0".to_string(),
            ));
        }

        if self.quota.storage_key.trim().is_empty() {
            return Err(ClinicalError::ConfigError(
                "quota.storage_key must not be empty".to_string(),
            ));
        }

        if self.resilience.initial_delay_ms == 0 {
            return Err(ClinicalError::ConfigError(
                "resilience.initial_delay_ms must be greater than 0".to_string(),
            ));
        }

        if self.resilience.max_retries > MAX_RETRIES_LIMIT {
            return Err(ClinicalError::ConfigError(format!(
                "resilience.max_retries must be at most {}",
                MAX_RETRIES_LIMIT
            )));
        }

        if self.resilience.cooldown_secs == 0 {
            return Err(ClinicalError::ConfigError(
                "resilience.cooldown_secs must be greater than 0".to_string(),
            ));
        }

        if self.ranking.max_reports == 0 || self.ranking.max_questions == 0 {
            return Err(ClinicalError::ConfigError(
                "ranking limits must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ClinicalError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Get state directory path
    pub fn state_dir(&self) -> PathBuf {
        Self::expand_path(&self.paths.state_dir)
    }
}
