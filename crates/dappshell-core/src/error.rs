//! Error types for `dappshell` core library.

use thiserror::Error;

/// Result type alias using `dappshell` Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for `dappshell` operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Key-value store error
    #[error("Store error: {0}")]
    Store(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
