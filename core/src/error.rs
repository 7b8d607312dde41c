//! Error types for the Test Monitor results client.
//!
//! # Design
//! `InvalidArgument` is raised locally before any request leaves the process.
//! Every 4xx/5xx response lands in `Http` with the raw status code and body,
//! so callers can branch on the status without re-reading the response.

use thiserror::Error;

/// Errors returned by `ResultsClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required argument was empty or missing. No request was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The server answered with a 4xx or 5xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The HTTP round-trip itself failed (connect, read, TLS).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized as JSON.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// Client configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Status code of an `Http` error, `None` for every other variant.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
