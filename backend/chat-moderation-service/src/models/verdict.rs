use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason attached to the synthetic verdict produced when classification fails
pub const ANALYSIS_FAILED_REASON: &str = "Analysis failed";

/// Moderation action, both as suggested by a verdict and as finally taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModerationAction {
    Warn,
    Mute,
    Nothing,
}

impl ModerationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationAction::Warn => "WARN",
            ModerationAction::Mute => "MUTE",
            ModerationAction::Nothing => "NOTHING",
        }
    }

    /// Lenient parse of classifier output. `NONE` is accepted as `NOTHING`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "WARN" | "WARNING" => Some(ModerationAction::Warn),
            "MUTE" => Some(ModerationAction::Mute),
            "NOTHING" | "NONE" => Some(ModerationAction::Nothing),
            _ => None,
        }
    }
}

impl fmt::Display for ModerationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Violation taxonomy shared with the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationType {
    None,
    Toxicity,
    Harassment,
    Spam,
    #[serde(rename = "NSFW")]
    Nsfw,
    HateSpeech,
}

impl ViolationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationType::None => "NONE",
            ViolationType::Toxicity => "TOXICITY",
            ViolationType::Harassment => "HARASSMENT",
            ViolationType::Spam => "SPAM",
            ViolationType::Nsfw => "NSFW",
            ViolationType::HateSpeech => "HATE_SPEECH",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_uppercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "NONE" | "" => Some(ViolationType::None),
            "TOXICITY" => Some(ViolationType::Toxicity),
            "HARASSMENT" => Some(ViolationType::Harassment),
            "SPAM" => Some(ViolationType::Spam),
            "NSFW" => Some(ViolationType::Nsfw),
            "HATE_SPEECH" | "HATESPEECH" => Some(ViolationType::HateSpeech),
            _ => None,
        }
    }
}

impl fmt::Display for ViolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Structured opinion of the classifier about one message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub action: ModerationAction,
    pub violation_type: ViolationType,
    /// 1-10 for real verdicts, 0 for the synthetic failure verdict
    pub severity: u8,
    pub reason: String,
    /// Used whenever the final action is a mute, including an escalated warn
    pub suggested_mute_minutes: Option<u32>,
}

impl Verdict {
    pub fn clean() -> Self {
        Self {
            action: ModerationAction::Nothing,
            violation_type: ViolationType::None,
            severity: 1,
            reason: "No violation detected".to_string(),
            suggested_mute_minutes: None,
        }
    }

    /// Verdict substituted for any classification failure
    pub fn analysis_failed() -> Self {
        Self {
            action: ModerationAction::Nothing,
            violation_type: ViolationType::None,
            severity: 0,
            reason: ANALYSIS_FAILED_REASON.to_string(),
            suggested_mute_minutes: None,
        }
    }

    pub fn warn(violation_type: ViolationType, severity: u8, reason: impl Into<String>) -> Self {
        Self {
            action: ModerationAction::Warn,
            violation_type,
            severity: severity.clamp(1, 10),
            reason: reason.into(),
            suggested_mute_minutes: None,
        }
    }

    pub fn mute(
        violation_type: ViolationType,
        severity: u8,
        reason: impl Into<String>,
        suggested_mute_minutes: Option<u32>,
    ) -> Self {
        Self {
            action: ModerationAction::Mute,
            violation_type,
            severity: severity.clamp(1, 10),
            reason: reason.into(),
            suggested_mute_minutes: suggested_mute_minutes.filter(|&m| m > 0),
        }
    }

    pub fn is_actionable(&self) -> bool {
        self.action != ModerationAction::Nothing
    }

    pub fn is_analysis_failure(&self) -> bool {
        self.severity == 0 && self.reason == ANALYSIS_FAILED_REASON
    }
}
