//! Session commands for the actor
//!
//! Every read and write of roster state goes through one of these, so the
//! actor is the only writer of standings and the audit log.

use super::ModerationOutcome;
use crate::error::Result;
use crate::models::{AuditEntry, ChatMessage, ModerationStats, UserStanding, Verdict};
use tokio::sync::oneshot;
use uuid::Uuid;

#[derive(Debug)]
pub enum SessionCommand {
    /// Record a message in the transcript; rejected if the sender is muted
    PostMessage {
        user_id: String,
        content: String,
        responder: oneshot::Sender<Result<ChatMessage>>,
    },

    /// Apply a verdict to the sender's latest standing
    ApplyVerdict {
        message_id: Uuid,
        user_id: String,
        content: String,
        verdict: Verdict,
        responder: oneshot::Sender<Result<ModerationOutcome>>,
    },

    /// Lift mutes due at the actor's current time
    ExpireMutes {
        responder: oneshot::Sender<Vec<AuditEntry>>,
    },

    /// Cycle the "posting as" identity
    SwitchActiveUser {
        responder: oneshot::Sender<UserStanding>,
    },

    ActiveUser {
        responder: oneshot::Sender<UserStanding>,
    },

    Standing {
        user_id: String,
        responder: oneshot::Sender<Result<UserStanding>>,
    },

    Roster {
        responder: oneshot::Sender<Vec<UserStanding>>,
    },

    /// Audit entries newest first, optionally for one user
    AuditEntries {
        user_id: Option<String>,
        responder: oneshot::Sender<Vec<AuditEntry>>,
    },

    Messages {
        responder: oneshot::Sender<Vec<ChatMessage>>,
    },

    Stats {
        responder: oneshot::Sender<ModerationStats>,
    },
}

impl SessionCommand {
    /// User the command is about, for logging
    pub fn user_id_hint(&self) -> Option<&str> {
        match self {
            Self::PostMessage { user_id, .. }
            | Self::ApplyVerdict { user_id, .. }
            | Self::Standing { user_id, .. } => Some(user_id),
            Self::AuditEntries { user_id, .. } => user_id.as_deref(),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::PostMessage { .. } => "post_message",
            Self::ApplyVerdict { .. } => "apply_verdict",
            Self::ExpireMutes { .. } => "expire_mutes",
            Self::SwitchActiveUser { .. } => "switch_active_user",
            Self::ActiveUser { .. } => "active_user",
            Self::Standing { .. } => "standing",
            Self::Roster { .. } => "roster",
            Self::AuditEntries { .. } => "audit_entries",
            Self::Messages { .. } => "messages",
            Self::Stats { .. } => "stats",
        }
    }
}
