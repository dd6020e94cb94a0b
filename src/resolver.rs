use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::dictionary::DemoDictionary;
use crate::error::TranslatorError;
use crate::languages::{self, LanguagePair};
use crate::providers::{self, Backend, ProviderKind};
use crate::settings::ProviderSettings;

pub const MAX_TEXT_CHARS: usize = 1000;

/// A validated translation request: trimmed, non-empty, at most 1000 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    text: String,
    source_lang: String,
    target_lang: String,
}

impl TranslationRequest {
    pub fn new(
        text: impl AsRef<str>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Result<Self, TranslatorError> {
        let text = text.as_ref().trim();
        if text.is_empty() {
            return Err(TranslatorError::InvalidRequest("text is empty".to_string()));
        }
        let count = text.chars().count();
        if count > MAX_TEXT_CHARS {
            return Err(TranslatorError::InvalidRequest(format!(
                "text is too long ({} characters, limit {})",
                count, MAX_TEXT_CHARS
            )));
        }
        Ok(Self {
            text: text.to_string(),
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source_lang(&self) -> &str {
        &self.source_lang
    }

    pub fn target_lang(&self) -> &str {
        &self.target_lang
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationResult {
    pub text: String,
    pub provider: ProviderKind,
    /// Set when neither a provider nor the dictionary could translate; `text` is then the
    /// original input.
    pub miss: bool,
}

impl TranslationResult {
    pub(crate) fn translated(text: String, provider: ProviderKind) -> Self {
        Self {
            text,
            provider,
            miss: false,
        }
    }

    pub(crate) fn unchanged(text: &str) -> Self {
        Self {
            text: text.to_string(),
            provider: ProviderKind::None,
            miss: false,
        }
    }

    pub(crate) fn terminal_miss(text: &str) -> Self {
        Self {
            text: text.to_string(),
            provider: ProviderKind::None,
            miss: true,
        }
    }

    pub fn is_miss(&self) -> bool {
        self.miss
    }

    /// True for the same-language short circuit.
    pub fn is_unchanged(&self) -> bool {
        self.provider == ProviderKind::None && !self.miss
    }
}

/// Tries the backends in their fixed order, then the demo dictionary. Never fails.
#[derive(Debug, Clone)]
pub struct Resolver {
    http: reqwest::Client,
    backends: Vec<Backend>,
    dictionary: DemoDictionary,
}

impl Resolver {
    pub fn new(http: reqwest::Client, backends: Vec<Backend>, dictionary: DemoDictionary) -> Self {
        Self {
            http,
            backends,
            dictionary,
        }
    }

    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, TranslatorError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;
        Ok(Self::new(
            http,
            providers::build_backends(settings),
            DemoDictionary::default(),
        ))
    }

    pub fn backends(&self) -> &[Backend] {
        &self.backends
    }

    pub async fn resolve(&self, request: &TranslationRequest) -> TranslationResult {
        let text = request.text();
        let source = languages::normalize(request.source_lang());
        let target = languages::normalize(request.target_lang());
        if source == target {
            debug!("source and target are both '{}'; returning input", source);
            return TranslationResult::unchanged(text);
        }

        let pair = LanguagePair::resolve(text, source, target);
        if pair.is_identity() {
            debug!("resolved pair {}->{} is identical; returning input", pair.source, pair.target);
            return TranslationResult::unchanged(text);
        }

        for backend in &self.backends {
            let kind = backend.kind();
            debug!("trying {} for {}->{}", kind, pair.source, pair.target);
            match backend.translate(&self.http, text, pair).await {
                Ok(translation) => {
                    info!("translated with {}", kind);
                    return TranslationResult::translated(translation, kind);
                }
                Err(err) => warn!("{} failed: {}", kind, err),
            }
        }

        if let Some(translation) = self.dictionary.lookup(pair.source, pair.target, text) {
            info!("translated with the demo dictionary");
            return TranslationResult::translated(translation.to_string(), ProviderKind::Demo);
        }

        warn!("no provider could translate the text ({}->{})", pair.source, pair.target);
        TranslationResult::terminal_miss(text)
    }
}
