//! Line console used as the presentation layer by the binary
//!
//! Parsing and rendering only. All state comes from the session handle as
//! read-only snapshots.

use crate::models::{AuditEntry, ChatMessage, ModerationAction, ModerationStats, UserStanding};
use crate::session::ModerationOutcome;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Plain text: submit as the active user
    Say(String),
    Switch,
    Users,
    Log,
    Stats,
    Messages,
    Help,
    Quit,
    Unknown(String),
    Empty,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ConsoleCommand::Empty;
        }

        if !line.starts_with('/') {
            return ConsoleCommand::Say(line.to_string());
        }

        let command = line.split_whitespace().next().unwrap_or(line);
        match command.to_lowercase().as_str() {
            "/switch" | "/s" => ConsoleCommand::Switch,
            "/users" | "/u" => ConsoleCommand::Users,
            "/log" | "/l" => ConsoleCommand::Log,
            "/stats" => ConsoleCommand::Stats,
            "/messages" | "/m" => ConsoleCommand::Messages,
            "/help" | "/h" | "/?" => ConsoleCommand::Help,
            "/quit" | "/q" | "/exit" => ConsoleCommand::Quit,
            other => ConsoleCommand::Unknown(other.to_string()),
        }
    }
}

pub const HELP: &str = "\
Type a message to post as the active user.
  /switch    post as the next user in the roster
  /users     show every user's standing
  /log       show the audit log, newest first
  /stats     show warning and mute totals
  /messages  show the chat transcript
  /help      show this help
  /quit      leave the chat";

fn time(at: DateTime<Utc>) -> String {
    at.format("%H:%M:%S").to_string()
}

pub fn render_banner(classifier: &str) -> String {
    format!("Chat moderation console (classifier: {})", classifier)
}

pub fn render_prompt(active: &UserStanding) -> String {
    match active.muted_until {
        Some(until) if active.muted => format!("[{} muted until {}]> ", active.username, time(until)),
        _ => format!("[{}]> ", active.username),
    }
}

pub fn render_standing(standing: &UserStanding) -> String {
    let status = match standing.muted_until {
        Some(until) if standing.muted => format!("MUTED until {}", time(until)),
        _ => "active".to_string(),
    };

    format!(
        "{:<12} {:<8} warnings {}  mutes {}  {}",
        standing.username, standing.user_id, standing.warning_count, standing.mute_count, status
    )
}

pub fn render_entry(entry: &AuditEntry) -> String {
    if entry.is_system_unmute() {
        return format!(
            "{} UNMUTE  {} - {}",
            time(entry.timestamp),
            entry.username,
            entry.reason
        );
    }

    let duration = entry
        .mute_duration_minutes
        .map(|minutes| format!(" ({} min)", minutes))
        .unwrap_or_default();

    format!(
        "{} {:<7}{} {} - {} | \"{}\"",
        time(entry.timestamp),
        entry.final_action,
        duration,
        entry.username,
        entry.reason,
        entry.original_content
    )
}

pub fn render_message(message: &ChatMessage) -> String {
    let flag = match &message.moderation {
        Some(verdict) => format!(
            "  [{} {} severity {}]",
            verdict.action, verdict.violation_type, verdict.severity
        ),
        None => String::new(),
    };

    format!(
        "{} {}: {}{}",
        time(message.timestamp),
        message.username,
        message.content,
        flag
    )
}

pub fn render_stats(stats: &ModerationStats) -> String {
    format!(
        "Total warnings: {}  Total mutes: {}  Active mutes: {}",
        stats.total_warnings, stats.total_mutes, stats.active_mutes
    )
}

pub fn render_outcome(outcome: &ModerationOutcome) -> String {
    let standing = &outcome.standing;

    match outcome.final_action {
        ModerationAction::Nothing if outcome.verdict.is_analysis_failure() => {
            "(moderation unavailable, message allowed)".to_string()
        }
        ModerationAction::Nothing => String::new(),
        ModerationAction::Warn => format!(
            "WARNING for {}: {} (warning #{})",
            standing.username, outcome.verdict.reason, standing.warning_count
        ),
        ModerationAction::Mute => {
            let until = standing.muted_until.map(time).unwrap_or_default();
            let minutes = outcome
                .audit_entry
                .as_ref()
                .and_then(|entry| entry.mute_duration_minutes)
                .unwrap_or_default();
            let prefix = if outcome.was_escalated() {
                "Too many warnings. "
            } else {
                ""
            };
            format!(
                "{}MUTED {} for {} min (until {}): {}",
                prefix, standing.username, minutes, until, outcome.verdict.reason
            )
        }
    }
}
