use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TranslatorError;
use crate::languages::LanguagePair;
use crate::settings::ProviderSettings;

mod gemini;
mod libretranslate;
mod lingva;
mod mymemory;

pub use gemini::Gemini;
pub use libretranslate::LibreTranslate;
pub use lingva::Lingva;
pub use mymemory::MyMemory;

/// Where a translation came from. `None` means the caller's text came back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Lingva,
    MyMemory,
    LibreTranslate,
    Demo,
    None,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Lingva => "lingva",
            ProviderKind::MyMemory => "mymemory",
            ProviderKind::LibreTranslate => "libretranslate",
            ProviderKind::Demo => "demo",
            ProviderKind::None => "none",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One network translation service. Each variant owns its request shape and its
/// response parser; the resolver only sees a translated string or an error.
#[derive(Debug, Clone)]
pub enum Backend {
    Lingva(Lingva),
    MyMemory(MyMemory),
    LibreTranslate(LibreTranslate),
}

impl Backend {
    pub fn kind(&self) -> ProviderKind {
        match self {
            Backend::Lingva(_) => ProviderKind::Lingva,
            Backend::MyMemory(_) => ProviderKind::MyMemory,
            Backend::LibreTranslate(_) => ProviderKind::LibreTranslate,
        }
    }

    pub async fn translate(
        &self,
        http: &reqwest::Client,
        text: &str,
        pair: LanguagePair,
    ) -> Result<String, TranslatorError> {
        match self {
            Backend::Lingva(backend) => backend.translate(http, text, pair).await,
            Backend::MyMemory(backend) => backend.translate(http, text, pair).await,
            Backend::LibreTranslate(backend) => backend.translate(http, text, pair).await,
        }
    }
}

/// The fixed chain order: Lingva, MyMemory, then the LibreTranslate mirrors.
pub fn build_backends(settings: &ProviderSettings) -> Vec<Backend> {
    let mut backends = Vec::new();
    if !settings.lingva_url.trim().is_empty() {
        backends.push(Backend::Lingva(Lingva::new(&settings.lingva_url)));
    }
    if !settings.mymemory_url.trim().is_empty() {
        backends.push(Backend::MyMemory(MyMemory::new(&settings.mymemory_url)));
    }
    if !settings.libretranslate_urls.is_empty() {
        backends.push(Backend::LibreTranslate(LibreTranslate::new(
            settings.libretranslate_urls.clone(),
        )));
    }
    backends
}

/// Reads the body of a 2xx response; anything else becomes a `Provider` error.
pub(crate) async fn success_body(response: reqwest::Response) -> Result<String, TranslatorError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(TranslatorError::Provider {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

pub(crate) fn require_text(value: Option<String>, field: &str) -> Result<String, TranslatorError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(TranslatorError::invalid_response(format!(
            "missing or empty `{}`",
            field
        ))),
    }
}

pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(
    body: &str,
    provider: ProviderKind,
) -> Result<T, TranslatorError> {
    serde_json::from_str(body).map_err(|err| {
        TranslatorError::invalid_response(format!("failed to parse {} response: {}", provider, err))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    #[test]
    fn backends_follow_the_fixed_order() {
        let settings = Settings::default();
        let kinds = build_backends(&settings.providers)
            .iter()
            .map(Backend::kind)
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                ProviderKind::Lingva,
                ProviderKind::MyMemory,
                ProviderKind::LibreTranslate
            ]
        );
    }

    #[test]
    fn empty_urls_drop_a_backend() {
        let mut settings = Settings::default();
        settings.providers.mymemory_url = String::new();
        settings.providers.libretranslate_urls.clear();
        let backends = build_backends(&settings.providers);
        assert_eq!(backends.len(), 1);
        assert_eq!(backends[0].kind(), ProviderKind::Lingva);
    }

    #[test]
    fn provider_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(ProviderKind::LibreTranslate).unwrap(),
            "libretranslate"
        );
        assert_eq!(ProviderKind::MyMemory.to_string(), "mymemory");
    }

    #[test]
    fn require_text_rejects_blank() {
        assert!(require_text(Some("  ".to_string()), "translation").is_err());
        assert!(require_text(None, "translation").is_err());
        assert_eq!(
            require_text(Some("Hi".to_string()), "translation").unwrap(),
            "Hi"
        );
    }
}
