//! Escalation engine: verdict + standing -> next standing + action taken

use crate::models::{AuditEntry, ModerationAction, MuteLadder, UserStanding, Verdict};
use chrono::{DateTime, Duration, Utc};

pub const DEFAULT_ESCALATION_THRESHOLD: u32 = 3;

/// Result of applying one verdict to one standing
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub standing: UserStanding,
    pub final_action: ModerationAction,
    pub mute_duration_minutes: Option<u32>,
    /// `None` when the verdict called for no action
    pub entry: Option<AuditEntry>,
}

impl Transition {
    pub fn escalated_from(&self, verdict: &Verdict) -> bool {
        verdict.action == ModerationAction::Warn && self.final_action == ModerationAction::Mute
    }
}

/// Pure transition table for warnings and mutes
#[derive(Debug, Clone)]
pub struct EscalationEngine {
    ladder: MuteLadder,
    escalation_threshold: u32,
}

impl EscalationEngine {
    pub fn new(ladder: MuteLadder, escalation_threshold: u32) -> Self {
        Self {
            ladder,
            escalation_threshold: escalation_threshold.max(1),
        }
    }

    /// Compute the standing that results from `verdict` at `now`.
    ///
    /// The caller must not pass a muted standing; muted senders are blocked
    /// before classification.
    pub fn apply(
        &self,
        standing: &UserStanding,
        verdict: &Verdict,
        content: &str,
        now: DateTime<Utc>,
    ) -> Transition {
        debug_assert!(
            !standing.muted,
            "escalation engine applied to muted user {}",
            standing.user_id
        );

        let mut final_action = verdict.action;
        let mut candidate_warnings = standing.warning_count;

        if final_action == ModerationAction::Warn {
            candidate_warnings = standing.warning_count.saturating_add(1);
            if candidate_warnings >= self.escalation_threshold {
                final_action = ModerationAction::Mute;
            }
        }

        let (next, mute_duration_minutes) = match final_action {
            ModerationAction::Nothing => {
                return Transition {
                    standing: standing.clone(),
                    final_action,
                    mute_duration_minutes: None,
                    entry: None,
                };
            }
            ModerationAction::Mute => {
                let duration = self.mute_duration(standing, verdict);
                let until = now + Duration::minutes(i64::from(duration));
                (standing.with_mute(until), Some(duration))
            }
            ModerationAction::Warn => (standing.with_warnings(candidate_warnings), None),
        };

        debug_assert!(next.check_invariant().is_ok());

        let entry = AuditEntry::new(
            &next,
            final_action,
            verdict.reason.clone(),
            content,
            mute_duration_minutes,
            now,
        );

        Transition {
            standing: next,
            final_action,
            mute_duration_minutes,
            entry: Some(entry),
        }
    }

    /// Classifier suggestion when positive, otherwise the ladder rung for the next strike
    fn mute_duration(&self, standing: &UserStanding, verdict: &Verdict) -> u32 {
        verdict
            .suggested_mute_minutes
            .filter(|&minutes| minutes > 0)
            .unwrap_or_else(|| {
                self.ladder
                    .duration_for_strike(standing.mute_count.saturating_add(1))
            })
    }
}

impl Default for EscalationEngine {
    fn default() -> Self {
        Self::new(MuteLadder::default(), DEFAULT_ESCALATION_THRESHOLD)
    }
}
