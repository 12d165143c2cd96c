//! Error types for ATTA sessions

use thiserror::Error;

/// Errors that end a session before the adapter protocol starts.
///
/// Problems reported by the adapter itself are not errors; they become a
/// [`FallbackReason`](crate::fallback::FallbackReason) instead.
#[derive(Error, Debug)]
pub enum AttaError {
    #[error("Must supply a 'test' or 'testFile' parameter")]
    MissingTest,

    #[error("Failed to load test from {uri}: {reason}")]
    Load { uri: String, reason: String },

    #[error("Test definition is not an object: {0}")]
    InvalidDefinition(String),

    #[error("Document was closed before content loaded")]
    DocumentClosed,

    #[error("Session already started")]
    AlreadyStarted,

    #[error("Assertion batch failed: {0}")]
    Batch(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type AttaResult<T> = Result<T, AttaError>;
