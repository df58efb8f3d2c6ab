use super::verdict::Verdict;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Chat transcript entry, annotated once its verdict calls for action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub user_id: String,
    pub username: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub moderation: Option<Verdict>,
}

impl ChatMessage {
    pub fn new(
        user_id: impl Into<String>,
        username: impl Into<String>,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            username: username.into(),
            content: content.into(),
            timestamp,
            moderation: None,
        }
    }

    pub fn is_flagged(&self) -> bool {
        self.moderation.is_some()
    }
}

/// Counters for a dashboard view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationStats {
    /// Warn entries in the audit log
    pub total_warnings: usize,
    /// Mute entries in the audit log
    pub total_mutes: usize,
    /// Users muted right now
    pub active_mutes: usize,
}
