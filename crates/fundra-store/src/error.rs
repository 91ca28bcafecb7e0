//! Error types for record store operations.

/// Errors from record store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store is unreachable or returned a 5xx status.
    #[error("record store unavailable: {reason}")]
    ServiceUnavailable {
        /// Human-readable description of the outage or error.
        reason: String,
    },

    /// The request timed out at the client.
    #[error("record store request timed out: {operation}")]
    Timeout {
        /// The operation that timed out (e.g. `GET projects/p-1`).
        operation: String,
    },

    /// The record does not exist (HTTP 404).
    #[error("record not found: {collection}/{id}")]
    NotFound {
        collection: String,
        id: String,
    },

    /// The store rejected the request (other 4xx).
    #[error("record store rejected {operation}: HTTP {status} — {body}")]
    Rejected {
        operation: String,
        status: u16,
        /// Response body excerpt for diagnostics.
        body: String,
    },

    /// The response body did not match the expected record shape.
    #[error("record store response for {operation} failed to decode: {reason}")]
    Decode {
        operation: String,
        reason: String,
    },

    /// The configured base URL is not a valid URL.
    #[error("invalid store base URL {url:?}: {reason}")]
    InvalidBaseUrl {
        url: String,
        reason: String,
    },
}

impl StoreError {
    /// Whether this error came from the store being unreachable or slow,
    /// as opposed to a definitive answer about the record.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ServiceUnavailable { .. } | Self::Timeout { .. }
        )
    }
}
