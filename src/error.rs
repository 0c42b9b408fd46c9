//! Custom error types for podrig
//!
//! User-friendly error messages for all failure scenarios.

use thiserror::Error;

/// Main error type for the podrig application
#[derive(Error, Debug)]
pub enum PodrigError {
    /// Switching the terminal into raw mode (or reading from it) failed
    #[error("Terminal input unavailable: {0}")]
    TerminalInput(String),

    /// A menu was built without any options
    #[error("Menu '{0}' has no options.")]
    EmptyMenu(String),

    /// An external command could not be started
    #[error("Failed to run '{command}': {reason}\n\n  → Make sure the tool is installed and on your PATH.")]
    CommandSpawn { command: String, reason: String },

    /// An external command ran but exited unsuccessfully
    #[error("'{command}' failed: {detail}")]
    CommandFailed { command: String, detail: String },

    /// An action could not complete
    #[error("{action} failed: {reason}")]
    ActionFailed { action: String, reason: String },

    /// A dependent action lacks the setup it needs
    #[error("{what} is not set up.\n\n  → {hint}")]
    ConfigurationMissing { what: String, hint: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Settings file is invalid: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML serialization/deserialization error
    #[error("Configuration file is invalid: {0}")]
    Toml(String),

    /// Invalid input from user
    #[error("{0}")]
    InvalidInput(String),

    /// Operation cancelled by user
    #[error("Operation cancelled.")]
    Cancelled,
}

impl PodrigError {
    /// Shorthand for [`PodrigError::ActionFailed`]
    pub fn action(action: impl Into<String>, reason: impl Into<String>) -> Self {
        PodrigError::ActionFailed {
            action: action.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for [`PodrigError::ConfigurationMissing`]
    pub fn missing(what: impl Into<String>, hint: impl Into<String>) -> Self {
        PodrigError::ConfigurationMissing {
            what: what.into(),
            hint: hint.into(),
        }
    }
}

impl From<toml::de::Error> for PodrigError {
    fn from(err: toml::de::Error) -> Self {
        PodrigError::Toml(err.to_string())
    }
}

impl From<toml::ser::Error> for PodrigError {
    fn from(err: toml::ser::Error) -> Self {
        PodrigError::Toml(err.to_string())
    }
}

/// Result type alias using PodrigError
pub type Result<T> = std::result::Result<T, PodrigError>;
