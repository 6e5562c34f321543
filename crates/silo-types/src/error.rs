//! Error types for silo.

use thiserror::Error;

/// Result type alias for silo operations.
pub type Result<T> = std::result::Result<T, SiloError>;

/// Errors that can occur during partition discovery, fetch, and persistence.
#[derive(Error, Debug)]
pub enum SiloError {
    /// Server returned a non-success status.
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body text, surfaced for diagnostics.
        body: String,
    },

    /// Request could not be completed (connect failure, timeout, bad URL).
    #[error("transport error: {0}")]
    Transport(String),

    /// Malformed or incomplete partition-metadata envelope.
    #[error("metadata error: {0}")]
    Metadata(String),

    /// Malformed data envelope, or the server reported an explicit error.
    #[error("data format error: {0}")]
    DataFormat(String),

    /// Table decode or concatenation failed.
    #[error("table error: {0}")]
    Table(String),

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A worker task could not be joined.
    #[error("worker error: {0}")]
    Worker(String),

    /// Filesystem error while writing partition output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
