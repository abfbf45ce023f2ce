//! Error types for stepwatch

use thiserror::Error;

/// Result type alias using the stepwatch Error
pub type Result<T> = std::result::Result<T, Error>;

/// stepwatch error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid thresholds for {profile}: fail {fail_ms} ms is below warn {warn_ms} ms")]
    InvalidThresholds {
        profile: String,
        warn_ms: u64,
        fail_ms: u64,
    },

    #[error("Evidence error: {0}")]
    Evidence(String),
}
