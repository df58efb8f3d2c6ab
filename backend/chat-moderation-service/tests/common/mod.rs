//! Shared fixtures for session integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chat_moderation_service::services::{
    AuditLog, ClassifierGateway, EscalationEngine, ManualTimeSource, ModerationClassifier,
};
use chat_moderation_service::{Result, SessionHandle, UserStanding, Verdict};
use chrono::{TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Classifier that replays queued verdicts, then answers clean
pub struct ScriptedClassifier {
    verdicts: Mutex<VecDeque<Verdict>>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedClassifier {
    pub fn new(verdicts: Vec<Verdict>) -> Self {
        Self {
            verdicts: Mutex::new(verdicts.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModerationClassifier for ScriptedClassifier {
    async fn analyze(&self, text: &str) -> Result<Verdict> {
        self.seen.lock().unwrap().push(text.to_string());
        let next = self.verdicts.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(Verdict::clean))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Classifier that holds every call until released
pub struct GatedClassifier {
    pub entered: Notify,
    pub release: Notify,
    verdict: Verdict,
}

impl GatedClassifier {
    pub fn new(verdict: Verdict) -> Self {
        Self {
            entered: Notify::new(),
            release: Notify::new(),
            verdict,
        }
    }
}

#[async_trait]
impl ModerationClassifier for GatedClassifier {
    async fn analyze(&self, _text: &str) -> Result<Verdict> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(self.verdict.clone())
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}

pub fn roster() -> Vec<UserStanding> {
    vec![
        UserStanding::new("user-1", "AlexPro", "https://picsum.photos/seed/user-1/100/100"),
        UserStanding::new("user-2", "CyberPunk", "https://picsum.photos/seed/user-2/100/100"),
        UserStanding::new("user-3", "SunnyDay", "https://picsum.photos/seed/user-3/100/100"),
    ]
}

pub fn test_clock() -> Arc<ManualTimeSource> {
    Arc::new(ManualTimeSource::new(
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap(),
    ))
}

pub fn spawn_session(
    backend: Arc<dyn ModerationClassifier>,
    clock: Arc<ManualTimeSource>,
) -> SessionHandle {
    SessionHandle::spawn(
        roster(),
        EscalationEngine::default(),
        ClassifierGateway::new(backend, Duration::from_secs(2)),
        AuditLog::new(),
        clock,
    )
    .expect("session should spawn")
}
