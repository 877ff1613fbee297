//! Error types for the PLACSP ingestion workspace

use thiserror::Error;

/// Result type alias for PLACSP operations
pub type Result<T> = std::result::Result<T, PlacspError>;

/// Main error type for PLACSP components
#[derive(Error, Debug)]
pub enum PlacspError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("File discovery error: {0}")]
    Discovery(String),
}
