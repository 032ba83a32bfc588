//! Error types shared across SM crates

use thiserror::Error;

/// Result type alias for shared SM operations
pub type Result<T> = std::result::Result<T, SmError>;

/// Error type for failures that are not specific to one service
#[derive(Error, Debug)]
pub enum SmError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid log setting: {0}")]
    InvalidLogSetting(String),
}
