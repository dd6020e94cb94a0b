use serde::{Deserialize, Serialize};

use crate::languages::Language;

/// Dictation languages offered to the user, as (tag, label).
pub const SPEECH_LANGUAGES: [(&str, &str); 4] = [
    ("ar-SA", "Arabic (Saudi Arabia)"),
    ("ar-EG", "Arabic (Egypt)"),
    ("en-US", "English (US)"),
    ("en-GB", "English (UK)"),
];

pub fn is_supported_tag(tag: &str) -> bool {
    SPEECH_LANGUAGES
        .iter()
        .any(|(known, _)| known.eq_ignore_ascii_case(tag.trim()))
}

/// One recognition result from the platform speech service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEvent {
    pub text: String,
    #[serde(default)]
    pub is_final: bool,
}

impl TranscriptEvent {
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    pub fn finalized(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

/// Final segments win; interim segments are only used when nothing was finalized.
pub fn combine_transcript(events: &[TranscriptEvent]) -> String {
    let finals: String = events
        .iter()
        .filter(|event| event.is_final)
        .map(|event| event.text.as_str())
        .collect();
    if !finals.trim().is_empty() {
        return finals.trim().to_string();
    }
    events
        .iter()
        .map(|event| event.text.as_str())
        .collect::<String>()
        .trim()
        .to_string()
}

/// What to hand to the platform text-to-speech service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Utterance {
    pub text: String,
    pub lang: &'static str,
    pub rate: f32,
}

impl Utterance {
    pub fn new(text: impl Into<String>, language: Language, rate: f32) -> Self {
        Self {
            text: text.into(),
            lang: language.speech_tag(),
            rate,
        }
    }
}
