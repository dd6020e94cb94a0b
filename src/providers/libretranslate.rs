use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{ProviderKind, parse_json, require_text, success_body};
use crate::error::TranslatorError;
use crate::languages::LanguagePair;

/// LibreTranslate-compatible mirrors, tried in listed order; the first success wins.
#[derive(Debug, Clone)]
pub struct LibreTranslate {
    mirrors: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LibreResponse {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

impl LibreTranslate {
    pub fn new(mirrors: Vec<String>) -> Self {
        Self { mirrors }
    }

    pub fn mirrors(&self) -> &[String] {
        &self.mirrors
    }

    pub async fn translate(
        &self,
        http: &reqwest::Client,
        text: &str,
        pair: LanguagePair,
    ) -> Result<String, TranslatorError> {
        let body = json!({
            "q": text,
            "source": pair.source.code(),
            "target": pair.target.code(),
            "format": "text"
        });

        let mut last_error = None;
        for mirror in &self.mirrors {
            match self.call_mirror(http, mirror, &body).await {
                Ok(translation) => return Ok(translation),
                Err(err) => {
                    debug!("LibreTranslate mirror {} failed: {}", mirror, err);
                    last_error = Some(err);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| {
            TranslatorError::Configuration("no LibreTranslate mirrors configured".to_string())
        }))
    }

    async fn call_mirror(
        &self,
        http: &reqwest::Client,
        mirror: &str,
        body: &serde_json::Value,
    ) -> Result<String, TranslatorError> {
        let response = http
            .post(mirror)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await?;
        let text = success_body(response).await?;
        parse(&text)
    }
}

pub(crate) fn parse(body: &str) -> Result<String, TranslatorError> {
    let payload: LibreResponse = parse_json(body, ProviderKind::LibreTranslate)?;
    require_text(payload.translated_text, "translatedText")
}
