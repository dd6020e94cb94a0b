use serde::{Deserialize, Serialize};

use crate::languages::AUTO;
use crate::providers::ProviderKind;
use crate::session::Translation;
use crate::speech::{TranscriptEvent, Utterance};

#[derive(Debug, Deserialize)]
pub(crate) struct TranslateBody {
    pub(crate) text: String,
    #[serde(default = "auto_tag")]
    pub(crate) source_lang: String,
    #[serde(default = "auto_tag")]
    pub(crate) target_lang: String,
    /// UI surface issuing the request ("tooltip", "popup", ...); enables last-request-wins.
    #[serde(default)]
    pub(crate) surface: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DictationBody {
    pub(crate) events: Vec<TranscriptEvent>,
    #[serde(default = "auto_tag")]
    pub(crate) source_lang: String,
    #[serde(default = "auto_tag")]
    pub(crate) target_lang: String,
    #[serde(default)]
    pub(crate) surface: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnhanceBody {
    pub(crate) original_text: String,
    pub(crate) translated_text: String,
    #[serde(default = "auto_tag")]
    pub(crate) source_lang: String,
    #[serde(default = "auto_tag")]
    pub(crate) target_lang: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TextBody {
    pub(crate) text: String,
    #[serde(default = "auto_tag")]
    pub(crate) lang: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CredentialBody {
    pub(crate) key: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TranslateResponse {
    pub(crate) text: String,
    pub(crate) display: String,
    pub(crate) provider: ProviderKind,
    pub(crate) miss: bool,
    pub(crate) source_lang: &'static str,
    pub(crate) target_lang: &'static str,
}

impl From<Translation> for TranslateResponse {
    fn from(translation: Translation) -> Self {
        Self {
            display: crate::output::display_translation(&translation.result),
            text: translation.result.text,
            provider: translation.result.provider,
            miss: translation.result.miss,
            source_lang: translation.pair.source.code(),
            target_lang: translation.pair.target.code(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DictationResponse {
    pub(crate) transcript: String,
    #[serde(flatten)]
    pub(crate) translation: TranslateResponse,
    pub(crate) utterance: Utterance,
}

/// Either the answer or `{"stale": true}` when a newer request from the same surface won.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum Sequenced<T> {
    Fresh(T),
    Stale { stale: bool },
}

impl<T> Sequenced<T> {
    pub(crate) fn stale() -> Self {
        Sequenced::Stale { stale: true }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CredentialStatus {
    pub(crate) configured: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) hint: Option<String>,
}

fn auto_tag() -> String {
    AUTO.to_string()
}
