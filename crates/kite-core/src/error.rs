//! Error types for editor sessions and feeds
//!
//! Every failure surfaced to a user goes through
//! `SessionError::user_message`, which keeps the backend's own wording for
//! rejections and falls back to a generic sentence otherwise.

use kite_api::ApiError;
use kite_compose::ComposeError;
use kite_model::ModelError;

/// Session-level errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No product has been loaded yet
    #[error("no product loaded")]
    NotLoaded,

    /// A save is already running
    #[error("a save is already in progress")]
    SaveInProgress,

    /// The session was torn down
    #[error("session torn down")]
    TornDown,

    /// A newer load replaced this one
    #[error("load superseded by a newer request")]
    Superseded,

    /// Composition failed
    #[error("composition failed: {0}")]
    Compose(#[from] ComposeError),

    /// Backend call failed
    #[error("service error: {0}")]
    Service(#[from] ApiError),

    /// Payload did not form a usable model
    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

impl SessionError {
    /// Message suitable for showing to the user
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Service(ApiError::Rejected(message) | ApiError::EmptyResponse(message)) => {
                message.clone()
            }
            Self::Service(ApiError::NotFound(_)) => "That item could not be found.".to_string(),
            Self::Service(_) => "Could not reach KitePaint. Please try again.".to_string(),
            Self::Compose(err) => format!("The \"{}\" template could not be read.", err.variation()),
            Self::Model(_) => "This product is missing colors or variations.".to_string(),
            Self::SaveInProgress => "Your design is still being saved.".to_string(),
            Self::NotLoaded | Self::TornDown | Self::Superseded => self.to_string(),
        }
    }
}

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_keeps_server_wording() {
        let err = SessionError::from(ApiError::rejected("Name already taken"));
        assert_eq!(err.user_message(), "Name already taken");
    }

    #[test]
    fn transport_failure_is_generic() {
        let err = SessionError::from(ApiError::Transport("connection reset".into()));
        assert!(!err.user_message().contains("connection reset"));
    }

    #[test]
    fn in_progress_display() {
        assert_eq!(SessionError::SaveInProgress.to_string(), "a save is already in progress");
    }
}
