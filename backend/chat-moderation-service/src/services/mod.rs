pub mod audit_log;
pub mod classifier;
pub mod escalation;
pub mod gemini_classifier;
pub mod mute_clock;
pub mod text_moderator;
pub mod time_source;

pub use audit_log::AuditLog;
pub use classifier::{ClassifierGateway, ModerationClassifier, RawVerdict};
pub use escalation::{EscalationEngine, Transition};
pub use gemini_classifier::GeminiClassifier;
pub use mute_clock::{expire_mutes, MuteClock};
pub use text_moderator::TextModerator;
pub use time_source::{ManualTimeSource, SystemTimeSource, TimeSource};
