//! Error types for configuration loading

use thiserror::Error;

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid JSON for the expected shape
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// Values parse but contradict each other
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
