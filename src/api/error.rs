//! Error types for backend API calls.

use thiserror::Error;

/// Errors returned by [`ApiClient`](super::ApiClient) operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (DNS, connection refused, TLS, broken body).
    #[error("network error calling {endpoint}: {source}")]
    Network {
        /// The endpoint URL that failed.
        endpoint: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The request did not complete within the client timeout.
    #[error("timeout calling {endpoint}")]
    Timeout {
        /// The endpoint URL that timed out.
        endpoint: String,
    },

    /// Non-200 status or `success: false` in the response envelope.
    #[error("API error from {endpoint} (HTTP {status}): {message}")]
    Api {
        /// The endpoint URL that rejected the request.
        endpoint: String,
        /// The HTTP status code.
        status: u16,
        /// Server-supplied message, or a generic fallback.
        message: String,
    },

    /// The response body could not be decoded into the expected envelope.
    #[error("malformed response from {endpoint}: {reason}")]
    Decode {
        /// The endpoint URL that returned the body.
        endpoint: String,
        /// Why decoding failed.
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client construction failed: {reason}")]
    Client {
        /// Why construction failed.
        reason: String,
    },
}

impl ApiError {
    /// Creates a network or timeout error from a reqwest error.
    pub fn transport(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                endpoint: endpoint.into(),
            }
        } else {
            Self::Network {
                endpoint: endpoint.into(),
                source,
            }
        }
    }

    /// Creates an API error, falling back to a generic message embedding the status.
    pub fn api(endpoint: impl Into<String>, status: u16, message: Option<String>) -> Self {
        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("request failed with status {status}"));
        Self::Api {
            endpoint: endpoint.into(),
            status,
            message,
        }
    }

    /// Creates a decode error.
    pub fn decode(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for transport-class failures (network and timeout).
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout { .. })
    }

    /// Short message suitable for a transient notification.
    #[must_use]
    pub fn short_message(&self) -> String {
        match self {
            Self::Network { .. } => "network error".to_string(),
            Self::Timeout { .. } => "request timed out".to_string(),
            Self::Api { message, .. } => message.clone(),
            Self::Decode { .. } => "unexpected server response".to_string(),
            Self::Client { .. } => "client unavailable".to_string(),
        }
    }
}
