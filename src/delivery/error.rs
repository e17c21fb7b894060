//! Error types for the delivery layer.

use thiserror::Error;

/// Defines the possible errors that can occur while delivering a report.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// An error related to invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error indicating that the report failed to be sent.
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    /// An error from the underlying `reqwest` or `reqwest_middleware`
    /// libraries.
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest_middleware::Error),
}

impl From<reqwest::Error> for DeliveryError {
    fn from(e: reqwest::Error) -> Self {
        DeliveryError::RequestError(reqwest_middleware::Error::Reqwest(e))
    }
}
