//! Error types for mercato-gateway
//!
//! These never reach the agents: the gateway turns every failure into
//! synthetic data. They exist so the cause can be logged accurately.

use thiserror::Error;

/// Gateway error type
#[derive(Debug, Error)]
pub enum Error {
    /// Network failure, timeout, server error or unusable body
    #[error("{provider} unavailable: {reason}")]
    ProviderUnavailable {
        /// Provider name
        provider: &'static str,
        /// What went wrong
        reason: String,
    },

    /// The provider refused the request (4xx), usually bad credentials
    #[error("{provider} rejected request with status {status}: {message}")]
    ProviderRejected {
        /// Provider name
        provider: &'static str,
        /// HTTP status code
        status: u16,
        /// Response body excerpt
        message: String,
    },

    /// Client could not be constructed
    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

impl Error {
    /// Build an unavailability error
    pub fn unavailable(provider: &'static str, reason: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            provider,
            reason: reason.into(),
        }
    }

    /// Whether the provider actively refused the request
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::ProviderRejected { .. })
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
