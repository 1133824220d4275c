//! Browser capability error types.

use thiserror::Error;

/// Errors raised by the browser capability.
#[derive(Error, Debug)]
pub enum BrowserError {
    /// Browser process could not be started.
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    /// Page navigation failed.
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// No element matched a selector.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// In-page script failed or returned something unusable.
    #[error("Script error: {0}")]
    Script(String),

    /// Waiting for a page state exceeded the engine timeout.
    #[error("Timeout waiting for {0}")]
    Timeout(String),

    /// Any other engine failure.
    #[error("Browser engine error: {0}")]
    Engine(String),
}

/// Result type for browser operations.
pub type Result<T> = std::result::Result<T, BrowserError>;

impl BrowserError {
    /// Wrap an engine-level error.
    pub fn engine(err: impl std::fmt::Display) -> Self {
        Self::Engine(err.to_string())
    }
}
