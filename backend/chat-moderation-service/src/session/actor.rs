//! Session actor
//!
//! Owns the roster, the audit log and the transcript. Commands are processed
//! one at a time from an mpsc channel, so escalation and mute expiry always
//! read the latest standing and never overwrite each other.

use super::commands::SessionCommand;
use super::{ModerationOutcome, SessionEvent};
use crate::error::{ModerationError, Result};
use crate::models::{
    AuditEntry, ChatMessage, ModerationAction, ModerationStats, UserStanding, Verdict,
};
use crate::services::mute_clock::expire_mutes;
use crate::services::{AuditLog, EscalationEngine, TimeSource};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

const COMMAND_BUFFER: usize = 100;

pub struct SessionActor {
    engine: EscalationEngine,
    standings: Vec<UserStanding>,
    active: usize,
    audit_log: AuditLog,
    messages: Vec<ChatMessage>,
    time_source: Arc<dyn TimeSource>,
    events: broadcast::Sender<SessionEvent>,
    rx: mpsc::Receiver<SessionCommand>,
}

impl SessionActor {
    /// Create the actor and the sender used to reach it
    pub fn new(
        roster: Vec<UserStanding>,
        engine: EscalationEngine,
        audit_log: AuditLog,
        time_source: Arc<dyn TimeSource>,
        events: broadcast::Sender<SessionEvent>,
    ) -> Result<(Self, mpsc::Sender<SessionCommand>)> {
        if roster.is_empty() {
            return Err(ModerationError::Config("roster must not be empty".to_string()));
        }

        let mut seen = HashSet::new();
        for standing in &roster {
            if !seen.insert(standing.user_id.as_str()) {
                return Err(ModerationError::Config(format!(
                    "duplicate user id in roster: {}",
                    standing.user_id
                )));
            }
            standing.check_invariant()?;
        }

        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let actor = Self {
            engine,
            standings: roster,
            active: 0,
            audit_log,
            messages: Vec::new(),
            time_source,
            events,
            rx,
        };
        Ok((actor, tx))
    }

    /// Process commands until every sender is dropped
    pub async fn run(mut self) {
        tracing::info!(users = self.standings.len(), "Session actor started");

        while let Some(cmd) = self.rx.recv().await {
            tracing::trace!(
                command = cmd.name(),
                user_id = cmd.user_id_hint().unwrap_or("-"),
                "Processing session command"
            );
            self.process_command(cmd);
        }

        tracing::info!("Session actor shutting down gracefully");
    }

    fn process_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::PostMessage {
                user_id,
                content,
                responder,
            } => {
                let result = self.handle_post_message(&user_id, content);
                let _ = responder.send(result);
            }
            SessionCommand::ApplyVerdict {
                message_id,
                user_id,
                content,
                verdict,
                responder,
            } => {
                let result = self.handle_apply_verdict(message_id, &user_id, &content, verdict);
                let _ = responder.send(result);
            }
            SessionCommand::ExpireMutes { responder } => {
                let result = self.handle_expire_mutes(self.time_source.now());
                let _ = responder.send(result);
            }
            SessionCommand::SwitchActiveUser { responder } => {
                let result = self.handle_switch_active_user();
                let _ = responder.send(result);
            }
            SessionCommand::ActiveUser { responder } => {
                let _ = responder.send(self.standings[self.active].clone());
            }
            SessionCommand::Standing { user_id, responder } => {
                let result = self.find(&user_id).map(|idx| self.standings[idx].clone());
                let _ = responder.send(result);
            }
            SessionCommand::Roster { responder } => {
                let _ = responder.send(self.standings.clone());
            }
            SessionCommand::AuditEntries { user_id, responder } => {
                let entries = match user_id {
                    Some(user_id) => self.audit_log.for_user(&user_id),
                    None => self.audit_log.all(),
                };
                let _ = responder.send(entries);
            }
            SessionCommand::Messages { responder } => {
                let _ = responder.send(self.messages.clone());
            }
            SessionCommand::Stats { responder } => {
                let _ = responder.send(self.stats());
            }
        }
    }

    fn find(&self, user_id: &str) -> Result<usize> {
        self.standings
            .iter()
            .position(|standing| standing.user_id == user_id)
            .ok_or_else(|| ModerationError::UserNotFound(user_id.to_string()))
    }

    fn blocked(standing: &UserStanding) -> Option<ModerationError> {
        match (standing.muted, standing.muted_until) {
            (true, Some(muted_until)) => Some(ModerationError::BlockedSend {
                user_id: standing.user_id.clone(),
                username: standing.username.clone(),
                muted_until,
            }),
            _ => None,
        }
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn handle_post_message(&mut self, user_id: &str, content: String) -> Result<ChatMessage> {
        if content.trim().is_empty() {
            return Err(ModerationError::InvalidInput(
                "Message cannot be empty".to_string(),
            ));
        }

        let idx = self.find(user_id)?;
        let standing = &self.standings[idx];

        if let Some(err) = Self::blocked(standing) {
            tracing::info!(
                user_id = %standing.user_id,
                muted_until = ?standing.muted_until,
                "Blocked send from muted user"
            );
            return Err(err);
        }

        let message = ChatMessage::new(
            &standing.user_id,
            &standing.username,
            content,
            self.time_source.now(),
        );
        self.messages.push(message.clone());
        self.publish(SessionEvent::MessagePosted(message.clone()));

        Ok(message)
    }

    fn handle_apply_verdict(
        &mut self,
        message_id: Uuid,
        user_id: &str,
        content: &str,
        verdict: Verdict,
    ) -> Result<ModerationOutcome> {
        let idx = self.find(user_id)?;
        let current = &self.standings[idx];

        // Submissions are serialized, so a sender cannot become muted mid-flight
        if let Some(err) = Self::blocked(current) {
            tracing::warn!(
                user_id = %current.user_id,
                "Verdict arrived for a muted user, discarding"
            );
            return Err(err);
        }

        let now = self.time_source.now();
        let transition = self.engine.apply(current, &verdict, content, now);

        if let Err(e) = transition.standing.check_invariant() {
            tracing::error!(user_id = %user_id, error = %e, "Transition rejected");
            return Err(e);
        }

        let changed = transition.standing != *current;
        self.standings[idx] = transition.standing.clone();

        match transition.final_action {
            ModerationAction::Mute => tracing::warn!(
                user_id = %user_id,
                suggested_action = %verdict.action,
                final_action = %transition.final_action,
                violation_type = %verdict.violation_type,
                severity = verdict.severity,
                mute_count = transition.standing.mute_count,
                duration_minutes = ?transition.mute_duration_minutes,
                muted_until = ?transition.standing.muted_until,
                "User muted"
            ),
            ModerationAction::Warn => tracing::info!(
                user_id = %user_id,
                violation_type = %verdict.violation_type,
                severity = verdict.severity,
                warning_count = transition.standing.warning_count,
                "User warned"
            ),
            ModerationAction::Nothing => tracing::debug!(
                user_id = %user_id,
                analysis_failed = verdict.is_analysis_failure(),
                "No action taken"
            ),
        }

        if let Some(entry) = &transition.entry {
            self.audit_log.append(entry.clone());
            self.publish(SessionEvent::AuditAppended(entry.clone()));
        }

        if changed {
            self.publish(SessionEvent::StandingUpdated(transition.standing.clone()));
        }

        let message = self.annotate_message(message_id, &verdict);

        Ok(ModerationOutcome {
            message,
            verdict,
            final_action: transition.final_action,
            standing: transition.standing,
            audit_entry: transition.entry,
        })
    }

    /// Attach the verdict to its transcript entry when it called for action
    fn annotate_message(&mut self, message_id: Uuid, verdict: &Verdict) -> Option<ChatMessage> {
        let message = self.messages.iter_mut().find(|m| m.id == message_id)?;

        if verdict.is_actionable() {
            message.moderation = Some(verdict.clone());
            let annotated = message.clone();
            self.publish(SessionEvent::MessageModerated(annotated.clone()));
            Some(annotated)
        } else {
            Some(message.clone())
        }
    }

    fn handle_expire_mutes(&mut self, now: DateTime<Utc>) -> Vec<AuditEntry> {
        let expired = expire_mutes(self.standings.iter_mut(), now);

        for entry in &expired {
            self.audit_log.append(entry.clone());
            if let Some(standing) = self.standings.iter().find(|s| s.user_id == entry.user_id) {
                self.publish(SessionEvent::StandingUpdated(standing.clone()));
            }
            self.publish(SessionEvent::AuditAppended(entry.clone()));
        }

        expired
    }

    fn handle_switch_active_user(&mut self) -> UserStanding {
        self.active = (self.active + 1) % self.standings.len();
        let active = self.standings[self.active].clone();

        tracing::debug!(user_id = %active.user_id, "Active user switched");
        self.publish(SessionEvent::ActiveUserChanged(active.clone()));

        active
    }

    fn stats(&self) -> ModerationStats {
        ModerationStats {
            total_warnings: self.audit_log.count_action(ModerationAction::Warn),
            total_mutes: self.audit_log.count_action(ModerationAction::Mute),
            active_mutes: self.standings.iter().filter(|s| s.muted).count(),
        }
    }
}
