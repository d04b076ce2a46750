//! Error types for mercato-store

use thiserror::Error;

/// Store error type
#[derive(Debug, Error)]
pub enum Error {
    /// Session not found
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Task result not found
    #[error("task result not found: {0}")]
    TaskResultNotFound(String),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
