//! Classifier gateway
//!
//! Backends are fallible. The gateway is not: every failure, timeout or
//! malformed payload becomes [`Verdict::analysis_failed`].

use crate::error::{ModerationError, Result};
use crate::models::{ModerationAction, Verdict, ViolationType};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

pub const DEFAULT_CLASSIFIER_TIMEOUT: Duration = Duration::from_secs(10);

/// A text classification backend
#[async_trait]
pub trait ModerationClassifier: Send + Sync {
    /// Classify one chat message
    async fn analyze(&self, text: &str) -> Result<Verdict>;

    /// Backend name for logs
    fn name(&self) -> &'static str;
}

/// Verdict payload as returned by the classifier, before validation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVerdict {
    pub action: String,
    pub violation_type: String,
    pub severity: f64,
    pub reason: String,
    #[serde(default, alias = "suggestedMuteMinutes")]
    pub suggested_mute_duration_minutes: Option<f64>,
}

impl RawVerdict {
    /// Parse a JSON payload into a validated verdict
    pub fn parse(payload: &str) -> Result<Verdict> {
        let raw: RawVerdict = serde_json::from_str(payload.trim())?;
        raw.into_verdict()
    }

    pub fn into_verdict(self) -> Result<Verdict> {
        let action = ModerationAction::parse(&self.action).ok_or_else(|| {
            ModerationError::Classification(format!("unknown action '{}'", self.action))
        })?;

        let violation_type = ViolationType::parse(&self.violation_type).unwrap_or_else(|| {
            tracing::debug!(
                violation_type = %self.violation_type,
                "Unknown violation type, recording as NONE"
            );
            ViolationType::None
        });

        if !self.severity.is_finite() {
            return Err(ModerationError::Classification(
                "severity is not a number".to_string(),
            ));
        }
        let severity = self.severity.round().clamp(1.0, 10.0) as u8;

        // Kept on any action: a warn that escalates still mutes for this long
        let suggested_mute_minutes = self
            .suggested_mute_duration_minutes
            .filter(|m| m.is_finite() && *m >= 1.0)
            .map(|m| m.round().min(f64::from(u32::MAX)) as u32);

        Ok(Verdict {
            action,
            violation_type,
            severity,
            reason: self.reason.trim().to_string(),
            suggested_mute_minutes,
        })
    }
}

/// Total wrapper around a classifier backend
#[derive(Clone)]
pub struct ClassifierGateway {
    backend: Arc<dyn ModerationClassifier>,
    timeout: Duration,
}

impl ClassifierGateway {
    pub fn new(backend: Arc<dyn ModerationClassifier>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Classify `text`. Never fails.
    pub async fn classify(&self, text: &str) -> Verdict {
        let start = Instant::now();

        let outcome = match timeout(self.timeout, self.backend.analyze(text)).await {
            Ok(result) => result,
            Err(_) => Err(ModerationError::Timeout(self.timeout)),
        };

        match outcome {
            Ok(verdict) => {
                tracing::debug!(
                    backend = self.backend.name(),
                    action = %verdict.action,
                    violation_type = %verdict.violation_type,
                    severity = verdict.severity,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Message classified"
                );
                verdict
            }
            Err(e) => {
                tracing::warn!(
                    backend = self.backend.name(),
                    error = %e,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Classification failed, treating message as clean"
                );
                Verdict::analysis_failed()
            }
        }
    }
}
