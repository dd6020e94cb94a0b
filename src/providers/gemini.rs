use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::success_body;
use crate::error::TranslatorError;
use crate::settings::GeminiSettings;

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Thin client for the `generateContent` endpoint. Returns the first candidate's text.
#[derive(Debug, Clone)]
pub struct Gemini {
    http: reqwest::Client,
    key: Option<String>,
    settings: GeminiSettings,
}

impl Gemini {
    pub fn new(http: reqwest::Client, settings: GeminiSettings) -> Self {
        Self {
            http,
            key: None,
            settings,
        }
    }

    pub fn with_key(mut self, key: Option<String>) -> Self {
        self.key = key.filter(|value| !value.trim().is_empty());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        if !model.trim().is_empty() {
            self.settings.model = model;
        }
        self
    }

    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.settings.api_url.trim_end_matches('/'),
            self.settings.model
        )
    }

    pub(crate) fn request_body(&self, prompt: &str) -> Value {
        let safety_settings = HARM_CATEGORIES
            .iter()
            .map(|category| {
                json!({
                    "category": category,
                    "threshold": self.settings.safety_threshold
                })
            })
            .collect::<Vec<_>>();

        json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": self.settings.temperature,
                "topK": self.settings.top_k,
                "topP": self.settings.top_p,
                "maxOutputTokens": self.settings.max_output_tokens
            },
            "safetySettings": safety_settings
        })
    }

    /// Sends one prompt. Fails with `Configuration` before touching the network when no key
    /// is set, and with `Provider` on any non-2xx answer.
    pub async fn generate(&self, prompt: &str) -> Result<String, TranslatorError> {
        let Some(key) = self.key.as_deref() else {
            return Err(TranslatorError::missing_credential());
        };

        debug!("calling Gemini model {}", self.settings.model);
        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", key)])
            .json(&self.request_body(prompt))
            .send()
            .await?;

        let body = success_body(response).await.inspect_err(|err| {
            if let TranslatorError::Provider { status, body } = err {
                warn!(
                    "Gemini API error ({}): {}",
                    status,
                    summarize_error(body).unwrap_or_else(|| body.clone())
                );
            }
        })?;
        extract_candidate_text(&body)
    }
}

pub(crate) fn extract_candidate_text(body: &str) -> Result<String, TranslatorError> {
    let payload: GeminiResponse = serde_json::from_str(body).map_err(|err| {
        TranslatorError::invalid_response(format!("failed to parse Gemini response JSON: {}", err))
    })?;
    payload
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .ok_or_else(|| TranslatorError::invalid_response("no valid response from Gemini"))
}

fn summarize_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<GeminiError>,
    }

    #[derive(Deserialize)]
    struct GeminiError {
        message: Option<String>,
        status: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let error = parsed.error?;
    let mut parts = Vec::new();
    if let Some(message) = error.message
        && !message.trim().is_empty()
    {
        parts.push(message);
    }
    if let Some(status) = error.status
        && !status.trim().is_empty()
    {
        parts.push(format!("status: {}", status));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}
