use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use std::sync::{Arc, RwLock};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::enhancement::{
    Enhancement, EnhancementClient, EnhancementRequest, GrammarExplanation, ModelReply,
    PronunciationHelp,
};
use crate::error::TranslatorError;
use crate::history::{HistoryEntry, HistoryStore};
use crate::languages::{self, LanguagePair};
use crate::providers::Gemini;
use crate::resolver::{Resolver, TranslationRequest, TranslationResult};
use crate::settings::{Preferences, Settings};
use crate::speech::{self, TranscriptEvent, Utterance};
use crate::store::{self, KeyValueStore};

const ENV_KEYS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// A translation together with the concrete language pair it was resolved for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub pair: LanguagePair,
    pub result: TranslationResult,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dictation {
    pub transcript: String,
    pub translation: Translation,
    pub utterance: Utterance,
}

/// Everything a front end needs, loaded once: resolver, enhancement client, credential,
/// preferences and history.
pub struct Session {
    settings: Settings,
    store: Arc<dyn KeyValueStore>,
    resolver: Resolver,
    gemini_http: reqwest::Client,
    enhancer: RwLock<EnhancementClient>,
    preferences: RwLock<Preferences>,
    history: HistoryStore,
    key_override: Option<String>,
    env_key: Option<String>,
}

impl Session {
    pub async fn init(
        settings: Settings,
        store: Arc<dyn KeyValueStore>,
        key_override: Option<String>,
    ) -> Result<Self> {
        let resolver = Resolver::from_settings(&settings.providers)
            .with_context(|| "failed to build the HTTP client")?;
        let gemini_http = reqwest::Client::builder()
            .build()
            .with_context(|| "failed to build the Gemini HTTP client")?;
        let history = HistoryStore::new(
            Arc::clone(&store),
            settings.history_limit,
            u64::from(settings.history_retention_days),
        );
        let preferences = load_preferences(store.as_ref(), &settings.preferences)?;
        let key_override = key_override.filter(|key| !key.trim().is_empty());
        let env_key = env_credential();
        let key = resolve_credential(key_override.as_deref(), store.as_ref(), env_key.as_deref())?;
        let enhancer = EnhancementClient::new(
            Gemini::new(gemini_http.clone(), settings.gemini.clone()).with_key(key),
        );

        if let Err(err) = history.purge_expired(OffsetDateTime::now_utc()) {
            warn!("failed to purge history: {:#}", err);
        }

        debug!(
            "session ready ({} backends, credential: {})",
            resolver.backends().len(),
            enhancer.has_credential()
        );
        Ok(Self {
            settings,
            store,
            resolver,
            gemini_http,
            enhancer: RwLock::new(enhancer),
            preferences: RwLock::new(preferences),
            history,
            key_override,
            env_key,
        })
    }

    /// Ignores `GEMINI_API_KEY` / `GOOGLE_API_KEY` from here on.
    pub fn without_environment(mut self) -> Result<Self> {
        self.env_key = None;
        self.reload_credential()?;
        Ok(self)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn has_credential(&self) -> bool {
        self.enhancer().map(|client| client.has_credential()).unwrap_or(false)
    }

    pub async fn translate(
        &self,
        text: &str,
        source_tag: &str,
        target_tag: &str,
    ) -> Result<Translation, TranslatorError> {
        let trimmed = text.trim();
        let pair = LanguagePair::resolve(trimmed, source_tag, target_tag);
        let request = TranslationRequest::new(trimmed, pair.source.code(), pair.target.code())?;
        let result = self.resolver.resolve(&request).await;

        if !result.is_unchanged() {
            let entry = HistoryEntry::new(
                request.text(),
                result.text.clone(),
                pair.source.code(),
                pair.target.code(),
                OffsetDateTime::now_utc(),
            );
            if let Err(err) = self.history.append(entry) {
                warn!("failed to record history: {:#}", err);
            }
        }
        Ok(Translation { pair, result })
    }

    pub async fn translate_dictation(
        &self,
        events: &[TranscriptEvent],
        source_tag: &str,
        target_tag: &str,
    ) -> Result<Dictation, TranslatorError> {
        let transcript = speech::combine_transcript(events);
        let translation = self.translate(&transcript, source_tag, target_tag).await?;
        let spoken_language = if translation.result.is_miss() || translation.result.is_unchanged()
        {
            translation.pair.source
        } else {
            translation.pair.target
        };
        let rate = self.preferences().speech_rate;
        let utterance = Utterance::new(translation.result.text.clone(), spoken_language, rate);
        Ok(Dictation {
            transcript,
            translation,
            utterance,
        })
    }

    pub async fn enhance(
        &self,
        original: &str,
        translated: &str,
        source_tag: &str,
        target_tag: &str,
    ) -> Result<ModelReply<Enhancement>, TranslatorError> {
        let request = EnhancementRequest {
            original_text: original.trim().to_string(),
            translated_text: translated.trim().to_string(),
            source_lang_name: languages::display_name(source_tag, original).to_string(),
            target_lang_name: languages::display_name(target_tag, translated).to_string(),
        };
        self.current_enhancer()?.enhance(&request).await
    }

    pub async fn explain_grammar(
        &self,
        text: &str,
        language_tag: &str,
    ) -> Result<ModelReply<GrammarExplanation>, TranslatorError> {
        let text = text.trim();
        let name = languages::display_name(language_tag, text);
        self.current_enhancer()?.explain_grammar(text, name).await
    }

    pub async fn pronunciation_help(
        &self,
        text: &str,
        language_tag: &str,
    ) -> Result<ModelReply<PronunciationHelp>, TranslatorError> {
        let text = text.trim();
        let name = languages::display_name(language_tag, text);
        self.current_enhancer()?.pronunciation_help(text, name).await
    }

    pub fn set_credential(&self, key: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(anyhow!("API key is empty"));
        }
        self.store
            .set(store::GEMINI_API_KEY, Value::String(key.to_string()))?;
        info!("saved Gemini API key");
        self.reload_credential()
    }

    pub fn clear_credential(&self) -> Result<()> {
        self.store.remove(store::GEMINI_API_KEY)?;
        info!("removed Gemini API key");
        self.reload_credential()
    }

    pub fn preferences(&self) -> Preferences {
        match self.preferences.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update_preferences(&self, preferences: Preferences) -> Result<()> {
        self.store
            .set(store::EXTENSION_SETTINGS, serde_json::to_value(&preferences)?)?;
        let mut guard = self
            .preferences
            .write()
            .map_err(|_| anyhow!("preferences lock poisoned"))?;
        *guard = preferences;
        Ok(())
    }

    fn reload_credential(&self) -> Result<()> {
        let key = resolve_credential(
            self.key_override.as_deref(),
            self.store.as_ref(),
            self.env_key.as_deref(),
        )?;
        let client = EnhancementClient::new(
            Gemini::new(self.gemini_http.clone(), self.settings.gemini.clone()).with_key(key),
        );
        let mut guard = self
            .enhancer
            .write()
            .map_err(|_| anyhow!("credential lock poisoned"))?;
        *guard = client;
        Ok(())
    }

    fn enhancer(&self) -> Result<EnhancementClient> {
        self.enhancer
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| anyhow!("credential lock poisoned"))
    }

    fn current_enhancer(&self) -> Result<EnhancementClient, TranslatorError> {
        self.enhancer()
            .map_err(|err| TranslatorError::Configuration(err.to_string()))
    }
}

/// `--key` override, then the stored key, then the environment. Blank values are skipped.
fn resolve_credential(
    key_override: Option<&str>,
    store: &dyn KeyValueStore,
    env_key: Option<&str>,
) -> Result<Option<String>> {
    if let Some(key) = non_blank(key_override) {
        return Ok(Some(key));
    }
    let stored = store
        .get(store::GEMINI_API_KEY)
        .with_context(|| "failed to read the stored API key")?;
    if let Some(key) = non_blank(stored.as_ref().and_then(Value::as_str)) {
        return Ok(Some(key));
    }
    Ok(non_blank(env_key))
}

fn env_credential() -> Option<String> {
    ENV_KEYS
        .iter()
        .find_map(|name| non_blank(std::env::var(name).ok().as_deref()))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Stored fields override the configured defaults one by one; unknown or mistyped fields
/// are ignored.
fn load_preferences(store: &dyn KeyValueStore, defaults: &Preferences) -> Result<Preferences> {
    let Some(Value::Object(stored)) = store
        .get(store::EXTENSION_SETTINGS)
        .with_context(|| "failed to read stored preferences")?
    else {
        return Ok(defaults.clone());
    };
    let Value::Object(mut merged) = serde_json::to_value(defaults)? else {
        return Ok(defaults.clone());
    };
    for (key, value) in stored {
        if merged.contains_key(&key) {
            let mut candidate = merged.clone();
            candidate.insert(key.clone(), value.clone());
            if serde_json::from_value::<Preferences>(Value::Object(candidate)).is_ok() {
                merged.insert(key, value);
            }
        }
    }
    Ok(serde_json::from_value(Value::Object(merged))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::TooltipPosition;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn offline_settings() -> Settings {
        let mut settings = Settings::default();
        settings.providers.lingva_url = String::new();
        settings.providers.mymemory_url = String::new();
        settings.providers.libretranslate_urls = Vec::new();
        settings
    }

    async fn session(store: Arc<dyn KeyValueStore>, key: Option<&str>) -> Session {
        Session::init(offline_settings(), store, key.map(str::to_string))
            .await
            .unwrap()
            .without_environment()
            .unwrap()
    }

    #[tokio::test]
    async fn auto_pair_is_resolved_and_recorded() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let session = session(Arc::clone(&store), None).await;

        let translation = session.translate("  مرحبا ", "auto", "auto").await.unwrap();
        assert_eq!(translation.pair.source.code(), "ar");
        assert_eq!(translation.pair.target.code(), "en");
        assert_eq!(translation.result.text, "Hello");

        let entries = session.history().list().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].original_text, "مرحبا");
        assert_eq!(entries[0].translated_text, "Hello");
        assert_eq!(entries[0].source_language, "ar");
    }

    #[tokio::test]
    async fn same_language_is_not_recorded() {
        let session = session(Arc::new(MemoryStore::new()), None).await;
        let translation = session.translate("hello", "en", "en-GB").await.unwrap();
        assert!(translation.result.is_unchanged());
        assert!(session.history().list().unwrap().is_empty());

        let err = session.translate("   ", "en", "ar").await.unwrap_err();
        assert!(matches!(err, TranslatorError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn credential_follows_override_then_store() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let session = session(Arc::clone(&store), None).await;
        assert!(!session.has_credential());
        let err = session.explain_grammar("hello", "auto").await.unwrap_err();
        assert!(err.is_configuration());

        session.set_credential(" stored-key ").unwrap();
        assert!(session.has_credential());
        assert_eq!(store.get(store::GEMINI_API_KEY).unwrap(), Some(json!("stored-key")));
        assert!(session.set_credential("  ").is_err());

        session.clear_credential().unwrap();
        assert!(!session.has_credential());

        let overridden = self::session(Arc::clone(&store), Some("cli-key")).await;
        overridden.clear_credential().unwrap();
        assert!(overridden.has_credential());
    }

    #[tokio::test]
    async fn preferences_merge_stored_fields_over_defaults() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store
            .set(
                store::EXTENSION_SETTINGS,
                json!({ "tooltipPosition": "above", "speechRate": "fast", "legacy": 1 }),
            )
            .unwrap();
        let session = session(Arc::clone(&store), None).await;
        let preferences = session.preferences();
        assert_eq!(preferences.tooltip_position, TooltipPosition::Above);
        assert_eq!(preferences.speech_rate, 0.9);
        assert!(!preferences.auto_translate_on_selection);

        let mut updated = preferences.clone();
        updated.translation_enabled = false;
        session.update_preferences(updated).unwrap();
        assert!(!session.preferences().translation_enabled);
        assert_eq!(
            store.get(store::EXTENSION_SETTINGS).unwrap().unwrap()["translationEnabled"],
            json!(false)
        );
    }

    #[tokio::test]
    async fn dictation_speaks_the_translation() {
        let session = session(Arc::new(MemoryStore::new()), None).await;
        let events = vec![
            TranscriptEvent::interim("شك"),
            TranscriptEvent::finalized("شكرا"),
        ];
        let dictation = session.translate_dictation(&events, "ar-SA", "auto").await.unwrap();
        assert_eq!(dictation.transcript, "شكرا");
        assert_eq!(dictation.translation.result.text, "Thank you");
        assert_eq!(dictation.utterance.lang, "en-US");
        assert_eq!(dictation.utterance.rate, 0.9);

        let err = session.translate_dictation(&[], "ar", "en").await.unwrap_err();
        assert!(matches!(err, TranslatorError::InvalidRequest(_)));
    }
}
