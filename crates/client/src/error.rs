//! Error taxonomy for client operations.
//!
//! Failures fall into a small number of classes:
//!
//! - [`ApiError::Network`]: no usable response was received. Never retried
//!   by this layer.
//! - [`ApiError::NotAuthenticated`]: raised locally, before any request is
//!   issued, when an operation requires an identity that is not held.
//! - [`ApiError::Unauthorized`]: the service answered 401 and the one-shot
//!   token refresh did not rescue the request.
//! - [`ApiError::Validation`]: client-side pre-flight rejection; the request
//!   never reaches the network.
//! - [`ApiError::Domain`]: the service rejected the request with a
//!   server-supplied message ("email already registered", "OTP expired",
//!   "insufficient stock", ...). Passed through verbatim for the caller to
//!   present.
//!
//! Callers never see a panic for a failed call; everything is a `Result`.

use thiserror::Error;

use paperback_core::{EmailError, OtpError, PasswordError};

/// Errors that can occur when talking to the bookstore service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request could not be sent or no response was received.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The operation requires a logged-in identity and none is held.
    /// Raised locally; no request is issued.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The service rejected the credential and the refresh attempt did not
    /// recover it.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Client-side validation failed before any request was issued.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The service refused the request with a domain-level message.
    #[error("request rejected ({status}): {message}")]
    Domain {
        /// HTTP status code returned by the service.
        status: u16,
        /// Server-supplied message, verbatim.
        message: String,
    },

    /// Response body could not be parsed.
    #[error("response parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl ApiError {
    /// Shorthand for a [`ApiError::Validation`] with a formatted message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Classify a non-2xx status plus server body into the taxonomy.
    #[must_use]
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => Self::Unauthorized(message),
            404 => Self::NotFound(message),
            _ => Self::Domain { status, message },
        }
    }

    /// Whether this failure was raised locally without touching the network.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated | Self::Validation(_) | Self::Config(_)
        )
    }
}

impl From<EmailError> for ApiError {
    fn from(err: EmailError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<OtpError> for ApiError {
    fn from(err: OtpError) -> Self {
        Self::Validation(err.to_string())
    }
}
