//! API error type

use thiserror::Error;

/// A failed backend call
///
/// The Controller treats every variant the same way ("operation failed");
/// the distinction exists for logs.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connect error, timeout or interrupted body
    #[error("request to {endpoint} failed: {source}")]
    Network {
        /// Endpoint path that was called
        endpoint: String,
        /// Underlying transport error
        #[source]
        source: reqwest::Error,
    },

    /// Backend answered with a non-2xx status
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        /// Endpoint path that was called
        endpoint: String,
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// Response body did not match the expected shape
    #[error("could not decode response from {endpoint}: {source}")]
    Decode {
        /// Endpoint path that was called
        endpoint: String,
        /// JSON error
        #[source]
        source: serde_json::Error,
    },

    /// A request URL could not be built
    #[error("invalid url {url}: {reason}")]
    InvalidUrl {
        /// The offending URL
        url: String,
        /// What was wrong with it
        reason: String,
    },
}

impl ApiError {
    /// HTTP status, if the backend answered at all
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend reported the resource as missing
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
