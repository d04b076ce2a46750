//! Error types for mercato-report

use thiserror::Error;

/// Rendering and artifact error type
#[derive(Debug, Error)]
pub enum Error {
    /// PDF generation failed
    #[error("pdf rendering failed: {0}")]
    Pdf(String),

    /// HTML template failed
    #[error("template rendering failed: {0}")]
    Template(String),

    /// Font could not be loaded
    #[error("font error: {0}")]
    Font(String),

    /// Filesystem error
    #[error("io error: {0}")]
    Io(String),

    /// Report name contains path components
    #[error("invalid report name: {0}")]
    InvalidName(String),

    /// Report does not exist
    #[error("report not found: {0}")]
    NotFound(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
