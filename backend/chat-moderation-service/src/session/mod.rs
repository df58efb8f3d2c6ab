//! Session coordinator
//!
//! [`SessionHandle`] is the only way to reach roster state. It posts the
//! message, runs classification outside the actor (so mute expiry keeps
//! ticking while the classifier is slow), then hands the verdict back to the
//! actor to apply against the sender's latest standing.

pub mod actor;
pub mod commands;

use crate::error::{ModerationError, Result};
use crate::models::{
    AuditEntry, ChatMessage, ModerationAction, ModerationStats, UserStanding, Verdict,
};
use crate::services::{AuditLog, ClassifierGateway, EscalationEngine, TimeSource};
use actor::SessionActor;
use commands::SessionCommand;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, Mutex};

const EVENT_BUFFER: usize = 256;

/// Read-only notifications for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SessionEvent {
    MessagePosted(ChatMessage),
    MessageModerated(ChatMessage),
    StandingUpdated(UserStanding),
    AuditAppended(AuditEntry),
    ActiveUserChanged(UserStanding),
}

/// What happened to one submitted message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModerationOutcome {
    /// Transcript entry, annotated if the verdict called for action
    pub message: Option<ChatMessage>,
    pub verdict: Verdict,
    pub final_action: ModerationAction,
    pub standing: UserStanding,
    pub audit_entry: Option<AuditEntry>,
}

impl ModerationOutcome {
    pub fn was_escalated(&self) -> bool {
        self.verdict.action == ModerationAction::Warn && self.final_action == ModerationAction::Mute
    }
}

/// Cloneable handle to a running session
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
    gateway: ClassifierGateway,
    submit_gate: Arc<Mutex<()>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    /// Register the roster and spawn the session actor on the current runtime
    pub fn spawn(
        roster: Vec<UserStanding>,
        engine: EscalationEngine,
        gateway: ClassifierGateway,
        audit_log: AuditLog,
        time_source: Arc<dyn TimeSource>,
    ) -> Result<Self> {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let (actor, tx) = SessionActor::new(roster, engine, audit_log, time_source, events.clone())?;

        tokio::spawn(actor.run());

        Ok(Self {
            tx,
            gateway,
            submit_gate: Arc::new(Mutex::new(())),
            events,
        })
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T> {
        let (responder, response) = oneshot::channel();
        self.tx
            .send(build(responder))
            .await
            .map_err(|_| ModerationError::SessionClosed)?;
        response.await.map_err(|_| ModerationError::SessionClosed)
    }

    /// Submit `text` as `user_id`.
    ///
    /// Fails with `BlockedSend` (no state change, no audit entry) while the
    /// user is muted. Submissions are processed one at a time per session.
    pub async fn submit_message(&self, user_id: &str, text: &str) -> Result<ModerationOutcome> {
        let _gate = self.submit_gate.lock().await;

        let message = self
            .request(|responder| SessionCommand::PostMessage {
                user_id: user_id.to_string(),
                content: text.to_string(),
                responder,
            })
            .await??;

        let verdict = self.gateway.classify(text).await;

        self.request(|responder| SessionCommand::ApplyVerdict {
            message_id: message.id,
            user_id: user_id.to_string(),
            content: text.to_string(),
            verdict,
            responder,
        })
        .await?
    }

    /// Submit as whoever is active when the call starts
    pub async fn submit_as_active(&self, text: &str) -> Result<ModerationOutcome> {
        let active = self.active_user().await?;
        self.submit_message(&active.user_id, text).await
    }

    /// Lift mutes that are due now
    pub async fn expire_mutes(&self) -> Result<Vec<AuditEntry>> {
        self.request(|responder| SessionCommand::ExpireMutes { responder })
            .await
    }

    pub async fn switch_active_user(&self) -> Result<UserStanding> {
        self.request(|responder| SessionCommand::SwitchActiveUser { responder })
            .await
    }

    pub async fn active_user(&self) -> Result<UserStanding> {
        self.request(|responder| SessionCommand::ActiveUser { responder })
            .await
    }

    pub async fn standing(&self, user_id: &str) -> Result<UserStanding> {
        self.request(|responder| SessionCommand::Standing {
            user_id: user_id.to_string(),
            responder,
        })
        .await?
    }

    pub async fn roster(&self) -> Result<Vec<UserStanding>> {
        self.request(|responder| SessionCommand::Roster { responder })
            .await
    }

    /// Audit log, newest first
    pub async fn audit_log(&self) -> Result<Vec<AuditEntry>> {
        self.request(|responder| SessionCommand::AuditEntries {
            user_id: None,
            responder,
        })
        .await
    }

    pub async fn audit_log_for(&self, user_id: &str) -> Result<Vec<AuditEntry>> {
        self.request(|responder| SessionCommand::AuditEntries {
            user_id: Some(user_id.to_string()),
            responder,
        })
        .await
    }

    pub async fn messages(&self) -> Result<Vec<ChatMessage>> {
        self.request(|responder| SessionCommand::Messages { responder })
            .await
    }

    pub async fn stats(&self) -> Result<ModerationStats> {
        self.request(|responder| SessionCommand::Stats { responder })
            .await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn classifier_name(&self) -> &'static str {
        self.gateway.backend_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ViolationType, MUTE_EXPIRED_REASON};
    use crate::services::{ManualTimeSource, ModerationClassifier};
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, Utc};
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    /// Returns queued verdicts in order, then clean verdicts
    struct ScriptedClassifier {
        verdicts: StdMutex<VecDeque<Verdict>>,
    }

    #[async_trait]
    impl ModerationClassifier for ScriptedClassifier {
        async fn analyze(&self, _text: &str) -> Result<Verdict> {
            let next = self.verdicts.lock().unwrap().pop_front();
            Ok(next.unwrap_or_else(Verdict::clean))
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn roster() -> Vec<UserStanding> {
        vec![
            UserStanding::new("user-1", "AlexPro", "https://picsum.photos/seed/alex/100"),
            UserStanding::new("user-2", "CyberPunk", "https://picsum.photos/seed/cyber/100"),
        ]
    }

    fn session(verdicts: Vec<Verdict>) -> (SessionHandle, Arc<ManualTimeSource>) {
        let clock = Arc::new(ManualTimeSource::new(Utc::now()));
        let backend = Arc::new(ScriptedClassifier {
            verdicts: StdMutex::new(verdicts.into()),
        });
        let handle = SessionHandle::spawn(
            roster(),
            EscalationEngine::default(),
            ClassifierGateway::new(backend, Duration::from_secs(1)),
            AuditLog::new(),
            clock.clone(),
        )
        .unwrap();
        (handle, clock)
    }

    #[tokio::test]
    async fn test_spawn_rejects_duplicate_ids() {
        let mut users = roster();
        users.push(UserStanding::new("user-1", "Dup", ""));
        let backend = Arc::new(ScriptedClassifier {
            verdicts: StdMutex::new(VecDeque::new()),
        });

        let result = SessionHandle::spawn(
            users,
            EscalationEngine::default(),
            ClassifierGateway::new(backend, Duration::from_secs(1)),
            AuditLog::new(),
            Arc::new(ManualTimeSource::new(Utc::now())),
        );
        assert!(matches!(result, Err(ModerationError::Config(_))));
    }

    #[tokio::test]
    async fn test_clean_message_changes_nothing() {
        let (handle, _) = session(vec![]);

        let outcome = handle.submit_message("user-1", "hello there").await.unwrap();
        assert_eq!(outcome.final_action, ModerationAction::Nothing);
        assert!(outcome.audit_entry.is_none());
        assert!(!outcome.message.unwrap().is_flagged());

        assert!(handle.audit_log().await.unwrap().is_empty());
        assert_eq!(handle.standing("user-1").await.unwrap(), roster()[0]);
        assert_eq!(handle.messages().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_muted_user_is_blocked() {
        let (handle, _) = session(vec![Verdict::mute(
            ViolationType::Harassment,
            9,
            "Threat",
            None,
        )]);

        let outcome = handle.submit_message("user-1", "threat").await.unwrap();
        assert_eq!(outcome.final_action, ModerationAction::Mute);

        let err = handle.submit_message("user-1", "let me talk").await.unwrap_err();
        assert!(err.is_blocked_send());
        assert_eq!(handle.audit_log().await.unwrap().len(), 1);
        assert_eq!(handle.messages().await.unwrap().len(), 1);
        assert_eq!(handle.standing("user-1").await.unwrap().mute_count, 1);
    }

    #[tokio::test]
    async fn test_expiry_through_session() {
        let (handle, clock) = session(vec![Verdict::mute(ViolationType::Spam, 7, "Flood", None)]);
        handle.submit_message("user-2", "buy buy buy").await.unwrap();

        assert!(handle.expire_mutes().await.unwrap().is_empty());

        clock.advance(ChronoDuration::minutes(5));
        let expired = handle.expire_mutes().await.unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].reason, MUTE_EXPIRED_REASON);

        let standing = handle.standing("user-2").await.unwrap();
        assert!(!standing.muted);
        assert!(standing.muted_until.is_none());
        assert!(handle.expire_mutes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_switch_active_user_cycles() {
        let (handle, _) = session(vec![]);

        assert_eq!(handle.active_user().await.unwrap().user_id, "user-1");
        assert_eq!(handle.switch_active_user().await.unwrap().user_id, "user-2");
        assert_eq!(handle.switch_active_user().await.unwrap().user_id, "user-1");
        assert_eq!(handle.roster().await.unwrap(), roster());
        assert_eq!(handle.classifier_name(), "scripted");
    }

    #[tokio::test]
    async fn test_empty_and_unknown_are_rejected() {
        let (handle, _) = session(vec![]);

        assert!(matches!(
            handle.submit_message("user-1", "   ").await,
            Err(ModerationError::InvalidInput(_))
        ));
        assert!(matches!(
            handle.submit_message("user-9", "hi").await,
            Err(ModerationError::UserNotFound(_))
        ));
    }
}
