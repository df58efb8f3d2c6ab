use super::standing::UserStanding;
use super::verdict::ModerationAction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MUTE_EXPIRED_REASON: &str = "Mute duration expired automatically";
pub const SYSTEM_UNMUTE_CONTENT: &str = "SYSTEM UNMUTE";

/// Immutable record of one action taken against a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub username: String,
    pub final_action: ModerationAction,
    pub reason: String,
    pub original_content: String,
    pub mute_duration_minutes: Option<u32>,
}

impl AuditEntry {
    pub fn new(
        standing: &UserStanding,
        final_action: ModerationAction,
        reason: impl Into<String>,
        original_content: impl Into<String>,
        mute_duration_minutes: Option<u32>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            user_id: standing.user_id.clone(),
            username: standing.username.clone(),
            final_action,
            reason: reason.into(),
            original_content: original_content.into(),
            mute_duration_minutes,
        }
    }

    /// Entry written by the mute clock when it lifts an expired mute
    pub fn mute_expired(standing: &UserStanding, timestamp: DateTime<Utc>) -> Self {
        Self::new(
            standing,
            ModerationAction::Nothing,
            MUTE_EXPIRED_REASON,
            SYSTEM_UNMUTE_CONTENT,
            None,
            timestamp,
        )
    }

    pub fn is_system_unmute(&self) -> bool {
        self.final_action == ModerationAction::Nothing && self.original_content == SYSTEM_UNMUTE_CONTENT
    }
}
