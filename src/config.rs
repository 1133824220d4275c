//! Configuration management module.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::AttendancePattern;
use crate::period;

/// File name of the configuration inside the user's config directory.
pub const CONFIG_FILE_NAME: &str = "hilan-attendance.toml";

/// Configuration load result.
#[derive(Debug)]
pub enum ConfigLoadResult {
    /// Config loaded successfully.
    Loaded(AppConfig),
    /// Config file missing (first run).
    Missing,
    /// Config file exists but invalid.
    Invalid(ConfigError),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config not found at {0}. Run 'hilan init' to create one.")]
    Missing(PathBuf),

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub portal: PortalConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub pay_period: PayPeriodConfig,
    #[serde(default)]
    pub pattern: AttendancePattern,
}

/// Hilan portal connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Company portal base URL, e.g. `https://acme.hilan.co.il`.
    pub url: String,
    pub username: String,
    pub password: String,
}

/// Browser launch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_headless")]
    pub headless: bool,
    /// Pause after each browser interaction, in milliseconds.
    #[serde(default = "default_slow_mo_ms")]
    pub slow_mo_ms: u64,
}

fn default_headless() -> bool {
    true
}

fn default_slow_mo_ms() -> u64 {
    500
}

/// Pay period settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayPeriodConfig {
    /// Day of month a pay period starts on (1-28).
    #[serde(default = "default_start_day")]
    pub start_day: u32,
}

fn default_start_day() -> u32 {
    20
}

impl AppConfig {
    /// Get config file path (`~/.config/hilan-attendance.toml` on Linux).
    pub fn default_path() -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_FILE_NAME)
    }

    /// Attempt to load config with detailed result.
    pub fn try_load(path: &Path) -> ConfigLoadResult {
        if !path.exists() {
            return ConfigLoadResult::Missing;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<AppConfig>(&content) {
                Ok(config) => match config.validate() {
                    Ok(()) => ConfigLoadResult::Loaded(config),
                    Err(e) => ConfigLoadResult::Invalid(e),
                },
                Err(e) => ConfigLoadResult::Invalid(ConfigError::Parse(e)),
            },
            Err(e) => ConfigLoadResult::Invalid(ConfigError::Read(e)),
        }
    }

    /// Load config, treating a missing file as an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match Self::try_load(path) {
            ConfigLoadResult::Loaded(config) => Ok(config),
            ConfigLoadResult::Missing => Err(ConfigError::Missing(path.to_path_buf())),
            ConfigLoadResult::Invalid(e) => Err(e),
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.portal.url.starts_with("http") {
            return Err(ConfigError::Validation(
                "Portal URL must start with http:// or https://".to_string(),
            ));
        }
        if self.portal.username.trim().is_empty() {
            return Err(ConfigError::Validation("Username cannot be empty".to_string()));
        }
        if !(1..=28).contains(&self.pay_period.start_day) {
            return Err(ConfigError::Validation(
                "Pay period start day must be between 1 and 28".to_string(),
            ));
        }
        self.pattern.validate().map_err(ConfigError::Validation)?;
        Ok(())
    }

    /// Save configuration to file, readable by the owner only.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    /// The pay period `today` falls into.
    pub fn current_pay_period(&self, today: NaiveDate) -> (i32, u32) {
        period::date_to_period(today, self.pay_period.start_day)
    }
}

impl PortalConfig {
    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            url: "https://yourcompany.hilan.co.il".to_string(),
            username: String::new(),
            password: String::new(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            slow_mo_ms: default_slow_mo_ms(),
        }
    }
}

impl Default for PayPeriodConfig {
    fn default() -> Self {
        Self {
            start_day: default_start_day(),
        }
    }
}
