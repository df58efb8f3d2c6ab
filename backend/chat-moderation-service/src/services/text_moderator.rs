use super::classifier::ModerationClassifier;
use crate::error::{ModerationError, Result};
use crate::models::{Verdict, ViolationType};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use unicode_segmentation::UnicodeSegmentation;

/// Score at which a local verdict suggests a mute instead of a warning
const MUTE_SCORE: f32 = 0.6;

static CONTACT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // Phone numbers (various formats)
        Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").expect("Phone regex pattern is valid"),
        // Email addresses
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
            .expect("Email regex pattern is valid"),
        // URLs
        Regex::new(r"https?://[^\s]+").expect("URL regex pattern is valid"),
        // Card-like digit groups
        Regex::new(r"\b\d{4}[\s-]?\d{4}[\s-]?\d{4}[\s-]?\d{4}\b")
            .expect("Card regex pattern is valid"),
    ]
});

static PUNCTUATION_FLOOD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[!?]{4,}").expect("Punctuation regex pattern is valid"));

/// One finding inside a message
#[derive(Debug, Clone, PartialEq)]
struct Hit {
    violation: ViolationType,
    weight: f32,
    label: String,
}

/// Offline classifier: word list, contact/URL patterns and shouting heuristics.
///
/// Word list lines are `word` or `category:word`, where category is one of the
/// violation types (`toxicity`, `harassment`, `spam`, `nsfw`, `hate_speech`).
/// Blank lines and `#` comments are ignored.
pub struct TextModerator {
    sensitive_words: HashMap<String, ViolationType>,
}

impl TextModerator {
    /// Load the word list from a file
    pub fn new(words_file: impl AsRef<Path>) -> Result<Self> {
        let path = words_file.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ModerationError::Config(format!(
                "Failed to load sensitive words from {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(Self::from_word_list(&content))
    }

    pub fn from_word_list(content: &str) -> Self {
        let sensitive_words = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| match line.split_once(':') {
                Some((category, word)) => (
                    word.trim().to_lowercase(),
                    // A listed word is always a violation; NONE or blank falls back
                    ViolationType::parse(category)
                        .filter(|violation| *violation != ViolationType::None)
                        .unwrap_or(ViolationType::Toxicity),
                ),
                None => (line.to_lowercase(), ViolationType::Toxicity),
            })
            .filter(|(word, _)| !word.is_empty())
            .collect();

        Self { sensitive_words }
    }

    pub fn word_count(&self) -> usize {
        self.sensitive_words.len()
    }

    /// Produce a verdict for `text`
    pub fn check(&self, text: &str) -> Verdict {
        let hits = self.collect_hits(text);
        if hits.is_empty() {
            return Verdict::clean();
        }

        let score: f32 = hits.iter().map(|hit| hit.weight).sum::<f32>().min(1.0);
        let severity = (score * 10.0).round().max(1.0) as u8;

        // Heaviest finding names the violation
        let primary = hits
            .iter()
            .max_by(|a, b| a.weight.total_cmp(&b.weight))
            .map(|hit| hit.violation)
            .unwrap_or(ViolationType::Toxicity);

        let labels: Vec<&str> = hits.iter().map(|hit| hit.label.as_str()).collect();
        let reason = format!("Local filter matched: {}", labels.join(", "));

        tracing::debug!(score, severity, violation_type = %primary, "Local moderation hits");

        if score >= MUTE_SCORE {
            Verdict::mute(primary, severity, reason, None)
        } else {
            Verdict::warn(primary, severity, reason)
        }
    }

    fn collect_hits(&self, text: &str) -> Vec<Hit> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let normalized = text.to_lowercase();
        let mut hits = Vec::new();

        for word in normalized.unicode_words() {
            if let Some(&violation) = self.sensitive_words.get(word) {
                let weight = match violation {
                    ViolationType::HateSpeech => 0.6,
                    ViolationType::Harassment | ViolationType::Nsfw => 0.4,
                    _ => 0.3,
                };
                hits.push(Hit {
                    violation,
                    weight,
                    label: format!("{} word '{}'", violation, word),
                });
            }
        }

        if CONTACT_PATTERNS.iter().any(|pattern| pattern.is_match(text)) {
            hits.push(Hit {
                violation: ViolationType::Spam,
                weight: 0.2,
                label: "contact details or link".to_string(),
            });
        }

        if PUNCTUATION_FLOOD.is_match(text) {
            hits.push(Hit {
                violation: ViolationType::Spam,
                weight: 0.1,
                label: "punctuation flood".to_string(),
            });
        }

        if has_excessive_caps(text) {
            hits.push(Hit {
                violation: ViolationType::Spam,
                weight: 0.1,
                label: "excessive capitalization".to_string(),
            });
        }

        if has_repeated_chars(text) {
            hits.push(Hit {
                violation: ViolationType::Spam,
                weight: 0.1,
                label: "repeated characters".to_string(),
            });
        }

        hits
    }
}

/// More than 70% capitals over at least 10 letters
fn has_excessive_caps(text: &str) -> bool {
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();

    if letters.len() < 10 {
        return false;
    }

    let caps_count = letters.iter().filter(|c| c.is_uppercase()).count();
    caps_count as f32 / letters.len() as f32 > 0.7
}

/// Same character five or more times in a row, e.g. "hellooooo"
fn has_repeated_chars(text: &str) -> bool {
    let mut previous = None;
    let mut run = 0;

    for c in text.chars() {
        if Some(c) == previous {
            run += 1;
            if run >= 5 {
                return true;
            }
        } else {
            previous = Some(c);
            run = 1;
        }
    }

    false
}

#[async_trait]
impl ModerationClassifier for TextModerator {
    async fn analyze(&self, text: &str) -> Result<Verdict> {
        Ok(self.check(text))
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
