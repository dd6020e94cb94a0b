mod reply;

use serde::Serialize;
use tera::{Context as TeraContext, Tera};
use tracing::{debug, warn};

use crate::error::TranslatorError;
use crate::providers::Gemini;

pub use reply::{
    Confidence, Difficulty, Enhancement, Formality, GrammarExplanation, ModelReply,
    PronunciationHelp, ReplyShape, VocabularyItem, parse_model_output, strip_code_fence,
};

const ENHANCE_PROMPT: &str = include_str!("prompts/enhance.tera");
const GRAMMAR_PROMPT: &str = include_str!("prompts/grammar.tera");
const PRONUNCIATION_PROMPT: &str = include_str!("prompts/pronunciation.tera");

/// Input for [`EnhancementClient::enhance`]. Language fields are display names
/// ("Arabic", "English"), not tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnhancementRequest {
    pub original_text: String,
    pub translated_text: String,
    pub source_lang_name: String,
    pub target_lang_name: String,
}

/// Learning aids on top of a basic translation, backed by Gemini.
#[derive(Debug, Clone)]
pub struct EnhancementClient {
    gemini: Gemini,
}

impl EnhancementClient {
    pub fn new(gemini: Gemini) -> Self {
        Self { gemini }
    }

    pub fn has_credential(&self) -> bool {
        self.gemini.has_key()
    }

    pub fn gemini(&self) -> &Gemini {
        &self.gemini
    }

    pub async fn enhance(
        &self,
        request: &EnhancementRequest,
    ) -> Result<ModelReply<Enhancement>, TranslatorError> {
        self.require_credential()?;
        let prompt = render_enhance_prompt(request)?;
        self.ask(&prompt, "enhancement").await
    }

    pub async fn explain_grammar(
        &self,
        text: &str,
        language_name: &str,
    ) -> Result<ModelReply<GrammarExplanation>, TranslatorError> {
        self.require_credential()?;
        let prompt = render_text_prompt(GRAMMAR_PROMPT, text, language_name)?;
        self.ask(&prompt, "grammar explanation").await
    }

    pub async fn pronunciation_help(
        &self,
        text: &str,
        language_name: &str,
    ) -> Result<ModelReply<PronunciationHelp>, TranslatorError> {
        self.require_credential()?;
        let prompt = render_text_prompt(PRONUNCIATION_PROMPT, text, language_name)?;
        self.ask(&prompt, "pronunciation help").await
    }

    fn require_credential(&self) -> Result<(), TranslatorError> {
        if self.has_credential() {
            Ok(())
        } else {
            Err(TranslatorError::missing_credential())
        }
    }

    async fn ask<T: ReplyShape>(
        &self,
        prompt: &str,
        label: &str,
    ) -> Result<ModelReply<T>, TranslatorError> {
        debug!("requesting {} from {}", label, self.gemini.model());
        let text = self.gemini.generate(prompt).await?;
        let reply = ModelReply::from_model_text(&text);
        if reply.is_raw() {
            warn!("{} reply was not the expected JSON object; returning raw text", label);
        }
        Ok(reply)
    }
}

pub(crate) fn render_enhance_prompt(
    request: &EnhancementRequest,
) -> Result<String, TranslatorError> {
    let mut context = TeraContext::new();
    context.insert("source_lang", &request.source_lang_name);
    context.insert("target_lang", &request.target_lang_name);
    context.insert("original", &request.original_text);
    context.insert("translated", &request.translated_text);
    render(ENHANCE_PROMPT, &context)
}

pub(crate) fn render_text_prompt(
    template: &str,
    text: &str,
    language_name: &str,
) -> Result<String, TranslatorError> {
    let mut context = TeraContext::new();
    context.insert("language", language_name);
    context.insert("text", text);
    render(template, &context)
}

fn render(template: &str, context: &TeraContext) -> Result<String, TranslatorError> {
    Tera::one_off(template, context, false).map_err(|err| {
        TranslatorError::Configuration(format!("failed to render prompt: {}", err))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    fn client(key: Option<&str>) -> EnhancementClient {
        let gemini = Gemini::new(reqwest::Client::new(), Settings::default().gemini)
            .with_key(key.map(str::to_string));
        EnhancementClient::new(gemini)
    }

    #[test]
    fn enhance_prompt_embeds_both_texts() {
        let prompt = render_enhance_prompt(&EnhancementRequest {
            original_text: "شكرا".to_string(),
            translated_text: "Thank you".to_string(),
            source_lang_name: "Arabic".to_string(),
            target_lang_name: "English".to_string(),
        })
        .unwrap();
        assert!(prompt.contains("Original Arabic: \"شكرا\""));
        assert!(prompt.contains("Basic English translation: \"Thank you\""));
        assert!(prompt.contains("\"formality\": \"formal|informal|neutral\""));
    }

    #[test]
    fn pronunciation_prompt_snapshot() {
        let prompt = render_text_prompt(PRONUNCIATION_PROMPT, "good morning", "English").unwrap();
        insta::assert_snapshot!(prompt.trim(), @r#"
        Provide pronunciation guidance for this English text: "good morning"

        Reply with ONLY a JSON object of this shape:
        {
          "phonetic": "Clear phonetic transcription",
          "pronunciation_tips": ["Specific pronunciation tip 1", "Specific pronunciation tip 2"],
          "common_mistakes": ["Common mistake learners make", "Another common mistake"]
        }
        "#);
    }

    #[test]
    fn grammar_prompt_names_the_language() {
        let prompt = render_text_prompt(GRAMMAR_PROMPT, "ذهب الولد", "Arabic").unwrap();
        assert!(prompt.starts_with("Analyze the grammar of this Arabic text: \"ذهب الولد\""));
        assert!(prompt.contains("difficulty_level"));
    }

    #[tokio::test]
    async fn missing_credential_fails_before_any_request() {
        let client = client(None);
        assert!(!client.has_credential());
        let err = client.explain_grammar("hello", "English").await.unwrap_err();
        assert!(err.is_configuration());
        let err = client.pronunciation_help("hello", "English").await.unwrap_err();
        assert_eq!(err.to_string(), "Gemini API key is not configured");
    }
}
