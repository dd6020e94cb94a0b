use reqwest::Url;
use serde::Deserialize;

use super::{ProviderKind, parse_json, require_text, success_body};
use crate::error::TranslatorError;
use crate::languages::LanguagePair;

/// `GET {base}/api/v1/{src}/{tgt}/{text}` answering `{ "translation": "..." }`.
#[derive(Debug, Clone)]
pub struct Lingva {
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct LingvaResponse {
    translation: Option<String>,
}

impl Lingva {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub(crate) fn endpoint(&self, text: &str, pair: LanguagePair) -> Result<Url, TranslatorError> {
        let mut url = Url::parse(self.base_url.trim()).map_err(|err| {
            TranslatorError::Configuration(format!("invalid Lingva URL: {}", err))
        })?;
        url.path_segments_mut()
            .map_err(|_| TranslatorError::Configuration("Lingva URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["api", "v1", pair.source.code(), pair.target.code(), text]);
        Ok(url)
    }

    pub async fn translate(
        &self,
        http: &reqwest::Client,
        text: &str,
        pair: LanguagePair,
    ) -> Result<String, TranslatorError> {
        let url = self.endpoint(text, pair)?;
        let response = http.get(url).send().await?;
        let body = success_body(response).await?;
        parse(&body)
    }
}

pub(crate) fn parse(body: &str) -> Result<String, TranslatorError> {
    let payload: LingvaResponse = parse_json(body, ProviderKind::Lingva)?;
    require_text(payload.translation, "translation")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::Language;

    #[test]
    fn endpoint_encodes_text_as_one_segment() {
        let lingva = Lingva::new("https://lingva.ml/");
        let pair = LanguagePair {
            source: Language::English,
            target: Language::Arabic,
        };
        let url = lingva.endpoint("how are you / ok?", pair).unwrap();
        assert_eq!(
            url.as_str(),
            "https://lingva.ml/api/v1/en/ar/how%20are%20you%20%2F%20ok%3F"
        );
    }

    #[test]
    fn parses_translation_field() {
        assert_eq!(parse(r#"{"translation":"مرحبا"}"#).unwrap(), "مرحبا");
        assert!(parse(r#"{"translation":""}"#).is_err());
        assert!(parse(r#"{"error":"nope"}"#).is_err());
        assert!(parse("<html>").is_err());
    }
}
