use serde::Deserialize;

use super::{ProviderKind, parse_json, require_text, success_body};
use crate::error::TranslatorError;
use crate::languages::LanguagePair;

/// `GET {base}/get?q={text}&langpair={src}|{tgt}`.
#[derive(Debug, Clone)]
pub struct MyMemory {
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct MyMemoryResponse {
    #[serde(rename = "responseData")]
    response_data: Option<ResponseData>,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    #[serde(rename = "translatedText")]
    translated_text: Option<serde_json::Value>,
}

impl MyMemory {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/get", self.base_url.trim().trim_end_matches('/'))
    }

    pub async fn translate(
        &self,
        http: &reqwest::Client,
        text: &str,
        pair: LanguagePair,
    ) -> Result<String, TranslatorError> {
        let langpair = format!("{}|{}", pair.source.code(), pair.target.code());
        let response = http
            .get(self.endpoint())
            .query(&[("q", text), ("langpair", langpair.as_str())])
            .send()
            .await?;
        let body = success_body(response).await?;
        parse(&body)
    }
}

/// `translatedText` must be a non-empty string; MyMemory sometimes answers with numbers or
/// nulls there when it rejects a request with HTTP 200.
pub(crate) fn parse(body: &str) -> Result<String, TranslatorError> {
    let payload: MyMemoryResponse = parse_json(body, ProviderKind::MyMemory)?;
    let text = payload
        .response_data
        .and_then(|data| data.translated_text)
        .and_then(|value| value.as_str().map(str::to_string));
    require_text(text, "responseData.translatedText")
}

#[cfg(test)]
mod tests {
    use super::parse;

    #[test]
    fn parses_nested_translated_text() {
        let body = r#"{"responseData":{"translatedText":"Hello","match":1},"responseStatus":200}"#;
        assert_eq!(parse(body).unwrap(), "Hello");
    }

    #[test]
    fn rejects_non_string_or_missing_text() {
        assert!(parse(r#"{"responseData":{"translatedText":42}}"#).is_err());
        assert!(parse(r#"{"responseData":null}"#).is_err());
        assert!(parse(r#"{}"#).is_err());
    }
}
