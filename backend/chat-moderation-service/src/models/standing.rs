//! Per-user moderation standing

use crate::error::{ModerationError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Moderation record for one roster user.
///
/// Identity fields never change after registration. Counters and mute state
/// are only replaced by the escalation engine and the mute clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStanding {
    pub user_id: String,
    pub username: String,
    pub avatar_ref: String,
    /// Consecutive warnings since the last mute
    pub warning_count: u32,
    /// Strikes issued this session, never reset
    pub mute_count: u32,
    pub muted: bool,
    pub muted_until: Option<DateTime<Utc>>,
}

impl UserStanding {
    /// Register a user with a clean record
    pub fn new(
        user_id: impl Into<String>,
        username: impl Into<String>,
        avatar_ref: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            avatar_ref: avatar_ref.into(),
            warning_count: 0,
            mute_count: 0,
            muted: false,
            muted_until: None,
        }
    }

    /// `muted` and `muted_until` must agree
    pub fn check_invariant(&self) -> Result<()> {
        match (self.muted, self.muted_until) {
            (true, Some(_)) | (false, None) => Ok(()),
            (true, None) => Err(ModerationError::InvariantViolation(format!(
                "user {} is muted without an expiry",
                self.user_id
            ))),
            (false, Some(until)) => Err(ModerationError::InvariantViolation(format!(
                "user {} has expiry {} but is not muted",
                self.user_id, until
            ))),
        }
    }

    /// True when a mute is in force and has reached its expiry
    pub fn mute_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.muted_until, Some(until) if self.muted && until <= now)
    }

    pub(crate) fn with_mute(&self, until: DateTime<Utc>) -> Self {
        Self {
            warning_count: 0,
            mute_count: self.mute_count + 1,
            muted: true,
            muted_until: Some(until),
            ..self.clone()
        }
    }

    pub(crate) fn with_warnings(&self, warning_count: u32) -> Self {
        Self {
            warning_count,
            ..self.clone()
        }
    }

    pub(crate) fn with_mute_lifted(&self) -> Self {
        Self {
            muted: false,
            muted_until: None,
            ..self.clone()
        }
    }
}
