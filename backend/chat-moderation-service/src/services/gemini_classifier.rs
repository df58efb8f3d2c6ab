// ============================================
// Gemini classifier backend
// ============================================
//
// Sends each chat message to the Gemini generateContent endpoint with a JSON
// response schema, then validates the returned payload into a Verdict.

use super::classifier::{ModerationClassifier, RawVerdict};
use crate::error::{ModerationError, Result};
use crate::models::Verdict;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";

pub struct GeminiClassifier {
    client: HttpClient,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClassifier {
    pub fn new(
        api_key: &str,
        model: &str,
        base_url: &str,
        request_timeout: Duration,
    ) -> Result<Self> {
        let client = HttpClient::builder().timeout(request_timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Instruction sent with every message
pub fn build_prompt(content: &str) -> String {
    format!(
        "Analyze the following chat message for violations of community safety guidelines.\n\
         Message: \"{}\"\n\n\
         Classify based on toxicity, harassment, spam, NSFW, or hate speech \
         (violationType one of NONE, TOXICITY, HARASSMENT, SPAM, NSFW, HATE_SPEECH).\n\
         If the message is safe, return NOTHING as the action.\n\
         If it's mildly problematic, suggest WARN.\n\
         If it's severely toxic or repeated, suggest MUTE.",
        content.replace('"', "\\\"")
    )
}

/// Structured output schema for the verdict object
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "action": {
                "type": "STRING",
                "description": "The suggested moderation action: WARN, MUTE, or NOTHING."
            },
            "violationType": {
                "type": "STRING",
                "description": "The type of violation detected."
            },
            "severity": {
                "type": "NUMBER",
                "description": "Severity score from 1 to 10."
            },
            "reason": {
                "type": "STRING",
                "description": "Brief explanation of why this action was suggested."
            },
            "suggestedMuteDurationMinutes": {
                "type": "NUMBER",
                "description": "Optional mute duration if action is MUTE."
            }
        },
        "required": ["action", "violationType", "severity", "reason"]
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

/// Pull the verdict JSON text out of a generateContent response body
fn extract_payload(body: &str) -> Result<String> {
    let response: GenerateContentResponse = serde_json::from_str(body)?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().map(|part| part.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ModerationError::Classification(
            "empty response from Gemini".to_string(),
        ));
    }

    Ok(text)
}

#[async_trait]
impl ModerationClassifier for GeminiClassifier {
    async fn analyze(&self, text: &str) -> Result<Verdict> {
        let request = GenerateContentRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: build_prompt(text),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: response_schema(),
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ModerationError::Classification(format!(
                "Gemini API returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let payload = extract_payload(&body)?;
        RawVerdict::parse(&payload)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
