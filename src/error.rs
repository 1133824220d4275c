//! Error types and handling.

use thiserror::Error;

use crate::config::ConfigError;
use crate::portal::BrowserError;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Browser engine or page interaction failed
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    /// Configuration could not be loaded or saved
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Portal authentication failed
    #[error("Login failed: invalid credentials or portal unreachable")]
    LoginFailed,

    /// The portal did not land on the expected page
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Background task could not be joined
    #[error("Task error: {0}")]
    Task(String),
}

/// Result type alias for AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Create a navigation error with message
    pub fn navigation(msg: impl Into<String>) -> Self {
        Self::Navigation(msg.into())
    }

    /// Create a validation error with message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether the run must stop outright on this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::LoginFailed | Self::Navigation(_) | Self::Browser(_))
    }
}
