pub mod config;
pub mod console;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod session;

// Re-export commonly used types
pub use config::{ClassifierBackend, Config};
pub use error::{ModerationError, Result};
pub use models::{
    AuditEntry, ChatMessage, ModerationAction, ModerationStats, MuteLadder, UserStanding, Verdict,
    ViolationType,
};
pub use services::{
    AuditLog, ClassifierGateway, EscalationEngine, GeminiClassifier, ModerationClassifier,
    MuteClock, TextModerator,
};
pub use session::{ModerationOutcome, SessionEvent, SessionHandle};
