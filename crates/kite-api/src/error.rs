//! Error types for service calls
//!
//! Distinguishes:
//! - Transport failures (connection, timeout, HTTP status)
//! - Explicit rejections from the backend (`valid: false` plus a message)
//! - Responses with no body at all
//! - Bodies that do not decode into the expected shape

use kite_model::ModelError;

/// Service call errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// HTTP layer failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Transport failure outside the HTTP client (fakes, adapters)
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend refused the request
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The backend answered without data
    #[error("empty response: {0}")]
    EmptyResponse(String),

    /// The requested record does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Body is not the expected JSON shape
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// A nested payload field failed to decode
    #[error("invalid payload: {0}")]
    Model(#[from] ModelError),
}

impl ApiError {
    /// Create rejection with server message
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    /// Create empty-response error with fallback message
    pub fn empty(message: impl Into<String>) -> Self {
        Self::EmptyResponse(message.into())
    }

    /// Whether the backend explicitly rejected the request
    #[inline]
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// Result type alias for service calls
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_display() {
        let err = ApiError::rejected("Name already taken");
        assert_eq!(err.to_string(), "request rejected: Name already taken");
        assert!(err.is_rejection());
    }

    #[test]
    fn decode_conversion() {
        let source = serde_json::from_str::<u8>("[]").unwrap_err();
        let err: ApiError = source.into();
        assert!(matches!(err, ApiError::Decode(_)));
        assert!(!err.is_rejection());
    }
}
