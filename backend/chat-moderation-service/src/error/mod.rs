use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Environment error: {0}")]
    Env(#[from] envy::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User {username} ({user_id}) is muted until {muted_until}")]
    BlockedSend {
        user_id: String,
        username: String,
        muted_until: DateTime<Utc>,
    },

    #[error("Classification failed: {0}")]
    Classification(String),

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Standing invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Moderation session is closed")]
    SessionClosed,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ModerationError {
    /// Text shown to the person at the keyboard.
    pub fn user_message(&self) -> String {
        match self {
            ModerationError::BlockedSend { muted_until, .. } => format!(
                "You are muted until {}",
                muted_until.format("%H:%M:%S")
            ),
            ModerationError::UserNotFound(id) => format!("Unknown user: {}", id),
            ModerationError::InvalidInput(msg) => msg.clone(),
            ModerationError::SessionClosed => "The chat session has ended".to_string(),
            other => {
                tracing::error!(error = %other, "Unexpected moderation error");
                "Something went wrong, please try again".to_string()
            }
        }
    }

    pub fn is_blocked_send(&self) -> bool {
        matches!(self, ModerationError::BlockedSend { .. })
    }
}

pub type Result<T> = std::result::Result<T, ModerationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_blocked_send_user_message() {
        let err = ModerationError::BlockedSend {
            user_id: "user-1".to_string(),
            username: "AlexPro".to_string(),
            muted_until: Utc.with_ymd_and_hms(2026, 1, 2, 13, 45, 7).unwrap(),
        };

        assert!(err.is_blocked_send());
        assert_eq!(err.user_message(), "You are muted until 13:45:07");
    }

    #[test]
    fn test_internal_errors_are_masked() {
        let err = ModerationError::Internal("actor panicked".to_string());
        assert!(!err.is_blocked_send());
        assert_eq!(err.user_message(), "Something went wrong, please try again");
    }
}
