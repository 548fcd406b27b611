//! Error types and failure classification for vendor calls.
//!
//! This module provides:
//! - [`VendorError`]: The error enum for every vendor adapter operation
//! - [`FailureClass`]: Classification used by health tracking and idempotent retries

mod retry;

pub use retry::FailureClass;

use thiserror::Error;

/// Errors that can occur while talking to an upstream vendor.
///
/// Each variant is classified into a [`FailureClass`] via the
/// [`failure_class`](Self::failure_class) method, which tells callers whether
/// the vendor-side outcome is known.
#[derive(Error, Debug)]
pub enum VendorError {
    /// The call exceeded its timeout. The vendor may or may not have
    /// processed the request.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The vendor throttled the request (HTTP 429 or quota exhausted).
    #[error("Rate limited by vendor: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The vendor answered with an error status or rejection code.
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The vendor or a gateway in front of it answered 5xx. The request may
    /// already have been applied.
    #[error("Server error from {provider}: HTTP {status} - {message}")]
    ServerError {
        /// The provider that answered
        provider: String,
        /// HTTP status code
        status: u16,
        /// Truncated response body
        message: String,
    },

    /// The vendor answered 2xx but the body could not be interpreted.
    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse {
        /// The provider that returned the response
        provider: String,
        /// What was wrong with the body
        message: String,
    },

    /// The payload is missing something the vendor requires.
    #[error("Invalid request for {provider}: {message}")]
    InvalidRequest {
        /// The provider the request was built for
        provider: String,
        /// Which field was missing or malformed
        message: String,
    },

    /// The adapter does not implement this operation.
    #[error("Operation '{operation}' not supported by {provider}")]
    NotSupported {
        /// The operation that was attempted
        operation: String,
        /// The provider that doesn't support it
        provider: String,
    },

    /// No endpoint path is configured for the operation.
    #[error("No endpoint configured for '{operation}' on {provider}")]
    MissingEndpoint {
        /// The operation without an endpoint
        operation: String,
        /// The provider being called
        provider: String,
    },

    /// A network error occurred before any response was received.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl VendorError {
    /// Returns the failure classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use billpay_vendors::errors::{FailureClass, VendorError};
    ///
    /// let error = VendorError::Timeout { provider: "vtpass".to_string() };
    /// assert_eq!(error.failure_class(), FailureClass::Unknown);
    ///
    /// let error = VendorError::MissingEndpoint {
    ///     operation: "list-plans".to_string(),
    ///     provider: "custom".to_string(),
    /// };
    /// assert_eq!(error.failure_class(), FailureClass::Configuration);
    /// ```
    pub fn failure_class(&self) -> FailureClass {
        match self {
            // Outcome unknown - the request may have reached the vendor
            Self::Timeout { .. } | Self::ServerError { .. } | Self::InvalidResponse { .. } => {
                FailureClass::Unknown
            }

            // Vendor answered and refused
            Self::RateLimited { .. } | Self::ProviderError { .. } => FailureClass::Rejected,

            // Never left the process
            Self::InvalidRequest { .. }
            | Self::NotSupported { .. }
            | Self::MissingEndpoint { .. } => FailureClass::Configuration,

            Self::Network(e) => {
                if e.is_timeout() {
                    FailureClass::Unknown
                } else if e.is_connect() || e.is_builder() {
                    // Connection never established, nothing was sent
                    FailureClass::Rejected
                } else {
                    FailureClass::Unknown
                }
            }
        }
    }

    /// True when the error reflects on the vendor's health.
    ///
    /// Configuration errors are local mistakes and say nothing about
    /// whether the vendor is reachable.
    pub fn counts_against_health(&self) -> bool {
        self.failure_class() != FailureClass::Configuration
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Network(e) => e.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_outcome_unknown() {
        let error = VendorError::Timeout {
            provider: "vtpass".to_string(),
        };
        assert_eq!(error.failure_class(), FailureClass::Unknown);
        assert!(error.is_timeout());
        assert!(error.counts_against_health());
    }

    #[test]
    fn test_provider_error_is_rejected() {
        let error = VendorError::ProviderError {
            provider: "clubkonnect".to_string(),
            message: "INSUFFICIENT_BALANCE".to_string(),
        };
        assert_eq!(error.failure_class(), FailureClass::Rejected);
        assert!(!error.is_timeout());
    }

    #[test]
    fn test_gateway_error_outcome_unknown() {
        let error = VendorError::ServerError {
            provider: "vtpass".to_string(),
            status: 504,
            message: "upstream timeout".to_string(),
        };
        assert_eq!(error.failure_class(), FailureClass::Unknown);
        assert!(error.counts_against_health());
        assert!(!error.is_timeout());
    }

    #[test]
    fn test_vendor_rate_limit_is_rejected() {
        let error = VendorError::RateLimited {
            provider: "vtpass".to_string(),
        };
        assert_eq!(error.failure_class(), FailureClass::Rejected);
    }

    #[test]
    fn test_unreadable_body_outcome_unknown() {
        let error = VendorError::InvalidResponse {
            provider: "vtpass".to_string(),
            message: "expected value at line 1".to_string(),
        };
        assert_eq!(error.failure_class(), FailureClass::Unknown);
        assert!(!error.is_timeout());
    }

    #[test]
    fn test_configuration_errors_do_not_touch_health() {
        let error = VendorError::NotSupported {
            operation: "list-plans".to_string(),
            provider: "custom".to_string(),
        };
        assert_eq!(error.failure_class(), FailureClass::Configuration);
        assert!(!error.counts_against_health());
    }

    #[test]
    fn test_error_display() {
        let error = VendorError::ProviderError {
            provider: "vtpass".to_string(),
            message: "HTTP 500".to_string(),
        };
        assert_eq!(format!("{}", error), "Provider error: vtpass - HTTP 500");

        let error = VendorError::MissingEndpoint {
            operation: "cable-purchase".to_string(),
            provider: "acme".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "No endpoint configured for 'cable-purchase' on acme"
        );
    }
}
