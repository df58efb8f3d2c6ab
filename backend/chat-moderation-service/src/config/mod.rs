use crate::error::{ModerationError, Result};
use crate::models::{MuteLadder, UserStanding};
use crate::services::gemini_classifier::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use serde::Deserialize;
use std::time::Duration;

/// Which classifier backend the gateway wraps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierBackend {
    Gemini,
    Local,
}

impl ClassifierBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassifierBackend::Gemini => "gemini",
            ClassifierBackend::Local => "local",
        }
    }
}

/// Environment variables as read, before validation
#[derive(Debug, Clone, Deserialize)]
struct RawConfig {
    #[serde(default = "default_service_name")]
    service_name: String,
    #[serde(default = "default_environment")]
    environment: String,
    #[serde(default = "default_mute_ladder")]
    mute_ladder: String,
    #[serde(default = "default_escalation_threshold")]
    escalation_threshold: u32,
    #[serde(default = "default_mute_clock_interval_secs")]
    mute_clock_interval_secs: u64,
    #[serde(default)]
    classifier_backend: Option<String>,
    #[serde(default = "default_classifier_timeout_secs")]
    classifier_timeout_secs: u64,
    #[serde(default)]
    gemini_api_key: Option<String>,
    #[serde(default = "default_gemini_model")]
    gemini_model: String,
    #[serde(default = "default_gemini_base_url")]
    gemini_base_url: String,
    #[serde(default = "default_sensitive_words_path")]
    sensitive_words_path: String,
    #[serde(default)]
    audit_log_capacity: Option<usize>,
    #[serde(default = "default_roster")]
    roster: String,
}

fn default_service_name() -> String {
    "chat-moderation-service".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_mute_ladder() -> String {
    "5,30,1440".to_string()
}

fn default_escalation_threshold() -> u32 {
    3
}

fn default_mute_clock_interval_secs() -> u64 {
    5
}

fn default_classifier_timeout_secs() -> u64 {
    10
}

fn default_gemini_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}

fn default_gemini_base_url() -> String {
    DEFAULT_GEMINI_BASE_URL.to_string()
}

fn default_sensitive_words_path() -> String {
    "data/sensitive_words.txt".to_string()
}

fn default_roster() -> String {
    "AlexPro,CyberPunk,SunnyDay".to_string()
}

#[derive(Debug, Clone)]
pub struct Config {
    // Service configuration
    pub service_name: String,
    pub environment: String,

    // Moderation policy
    pub mute_ladder: MuteLadder,
    pub escalation_threshold: u32,
    pub mute_clock_interval: Duration,
    pub audit_log_capacity: Option<usize>,

    // Classifier
    pub classifier_backend: ClassifierBackend,
    pub classifier_timeout: Duration,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub sensitive_words_path: String,

    /// Usernames in roster order
    pub roster: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let raw: RawConfig = envy::from_env()?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        let mute_ladder = MuteLadder::parse(&raw.mute_ladder)?;

        if raw.escalation_threshold == 0 {
            return Err(ModerationError::Config(
                "ESCALATION_THRESHOLD must be at least 1".to_string(),
            ));
        }

        if raw.mute_clock_interval_secs == 0 {
            return Err(ModerationError::Config(
                "MUTE_CLOCK_INTERVAL_SECS must be at least 1".to_string(),
            ));
        }

        if raw.classifier_timeout_secs == 0 {
            return Err(ModerationError::Config(
                "CLASSIFIER_TIMEOUT_SECS must be at least 1".to_string(),
            ));
        }

        let gemini_api_key = raw.gemini_api_key.filter(|key| !key.trim().is_empty());

        let classifier_backend = match raw.classifier_backend.as_deref().map(str::trim) {
            Some(name) if name.eq_ignore_ascii_case("gemini") => ClassifierBackend::Gemini,
            Some(name) if name.eq_ignore_ascii_case("local") => ClassifierBackend::Local,
            Some(other) => {
                return Err(ModerationError::Config(format!(
                    "unknown CLASSIFIER_BACKEND '{}', expected gemini or local",
                    other
                )))
            }
            None if gemini_api_key.is_some() => ClassifierBackend::Gemini,
            None => ClassifierBackend::Local,
        };

        if classifier_backend == ClassifierBackend::Gemini && gemini_api_key.is_none() {
            return Err(ModerationError::Config(
                "GEMINI_API_KEY must be set for the gemini classifier".to_string(),
            ));
        }

        let roster: Vec<String> = raw
            .roster
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        if roster.is_empty() {
            return Err(ModerationError::Config("ROSTER must name at least one user".to_string()));
        }

        Ok(Self {
            service_name: raw.service_name,
            environment: raw.environment,
            mute_ladder,
            escalation_threshold: raw.escalation_threshold,
            mute_clock_interval: Duration::from_secs(raw.mute_clock_interval_secs),
            audit_log_capacity: raw.audit_log_capacity.filter(|&c| c > 0),
            classifier_backend,
            classifier_timeout: Duration::from_secs(raw.classifier_timeout_secs),
            gemini_api_key,
            gemini_model: raw.gemini_model,
            gemini_base_url: raw.gemini_base_url,
            sensitive_words_path: raw.sensitive_words_path,
            roster,
        })
    }

    /// Fresh standings for the configured roster (`user-1`, `user-2`, ...)
    pub fn registered_roster(&self) -> Vec<UserStanding> {
        self.roster
            .iter()
            .enumerate()
            .map(|(idx, username)| {
                UserStanding::new(
                    format!("user-{}", idx + 1),
                    username.clone(),
                    format!("https://picsum.photos/seed/{}/100", username.to_lowercase()),
                )
            })
            .collect()
    }
}
