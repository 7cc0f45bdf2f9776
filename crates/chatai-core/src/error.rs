//! Error types for chatai-core

use thiserror::Error;

/// Main error type for chatai-core
#[derive(Error, Debug)]
pub enum Error {
    /// Non-2xx response from the generative-language API
    #[error("Answer service error: {0}")]
    Api(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response envelope did not have the expected shape
    #[error("Failed to decode answer: {0}")]
    Decode(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Index {index} is out of range for history of length {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("A request is already in flight")]
    Busy,

    #[error("Question must not be empty")]
    EmptyQuestion,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error came from talking to the answer service
    pub fn is_service_failure(&self) -> bool {
        matches!(self, Self::Api(_) | Self::Http(_) | Self::Decode(_))
    }
}

/// Result type alias for chatai-core
pub type Result<T> = std::result::Result<T, Error>;
