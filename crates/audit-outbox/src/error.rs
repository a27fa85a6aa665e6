//! Outbox error types.

use thiserror::Error;

/// Failure of a single transport call.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection, timeout or TLS failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Collector answered with a non-success status
    #[error("Collector returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Send error from a non-HTTP transport
    #[error("Send failed: {0}")]
    Send(String),
}

/// Result type alias using TransportError.
pub type TransportResult<T> = Result<T, TransportError>;

/// Outbox error type.
#[derive(Error, Debug)]
pub enum OutboxError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Transport construction error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using OutboxError.
pub type OutboxResult<T> = Result<T, OutboxError>;
