use serde::{Deserialize, Serialize};
use std::fmt;

pub const AUTO: &str = "auto";

const ARABIC_BLOCK: std::ops::RangeInclusive<char> = '\u{0600}'..='\u{06FF}';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "ar")]
    Arabic,
    #[serde(rename = "en")]
    English,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Arabic => "ar",
            Language::English => "en",
        }
    }

    /// Human readable name used inside model prompts.
    pub fn name(&self) -> &'static str {
        match self {
            Language::Arabic => "Arabic",
            Language::English => "English",
        }
    }

    /// Platform speech tag used when speaking text in this language.
    pub fn speech_tag(&self) -> &'static str {
        match self {
            Language::Arabic => "ar-SA",
            Language::English => "en-US",
        }
    }

    pub fn other(&self) -> Language {
        match self {
            Language::Arabic => Language::English,
            Language::English => Language::Arabic,
        }
    }

    pub fn from_tag(tag: &str) -> Option<Language> {
        match normalize(tag) {
            "ar" => Some(Language::Arabic),
            "en" => Some(Language::English),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Maps ISO codes and extended speech tags ("ar-EG", "en_GB") to "ar", "en" or "auto".
pub fn normalize(tag: &str) -> &'static str {
    let lower = tag.trim().to_ascii_lowercase();
    if lower.starts_with("ar") {
        "ar"
    } else if lower.starts_with("en") {
        "en"
    } else {
        AUTO
    }
}

/// Any code point in the Arabic block makes the text Arabic; everything else, the empty
/// string included, is English.
pub fn detect(text: &str) -> Language {
    if text.chars().any(|ch| ARABIC_BLOCK.contains(&ch)) {
        Language::Arabic
    } else {
        Language::English
    }
}

/// Display name for a tag, falling back to detection for "auto".
pub fn display_name(tag: &str, text: &str) -> &'static str {
    Language::from_tag(tag).unwrap_or_else(|| detect(text)).name()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguagePair {
    pub source: Language,
    pub target: Language,
}

impl LanguagePair {
    /// Turns possibly-"auto" tags into a concrete pair. An "auto" source is detected from
    /// the text; an "auto" target is whichever language the source is not.
    pub fn resolve(text: &str, source_tag: &str, target_tag: &str) -> Self {
        let source = Language::from_tag(source_tag).unwrap_or_else(|| detect(text));
        let target = Language::from_tag(target_tag).unwrap_or_else(|| source.other());
        LanguagePair { source, target }
    }

    pub fn swapped(&self) -> Self {
        LanguagePair {
            source: self.target,
            target: self.source,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_maps_speech_tags_to_iso() {
        assert_eq!(normalize("ar-SA"), "ar");
        assert_eq!(normalize("ar-EG"), "ar");
        assert_eq!(normalize("en-GB"), "en");
        assert_eq!(normalize(" EN "), "en");
        assert_eq!(normalize("auto"), "auto");
        assert_eq!(normalize(""), "auto");
        assert_eq!(normalize("fr-FR"), "auto");
    }

    #[test]
    fn detect_uses_arabic_block() {
        assert_eq!(detect("مرحبا"), Language::Arabic);
        assert_eq!(detect("hello"), Language::English);
        assert_eq!(detect("hello مرحبا"), Language::Arabic);
        assert_eq!(detect(""), Language::English);
    }

    #[test]
    fn auto_pair_targets_the_other_language() {
        let pair = LanguagePair::resolve("شكرا", "auto", "auto");
        assert_eq!(pair.source, Language::Arabic);
        assert_eq!(pair.target, Language::English);

        let pair = LanguagePair::resolve("thanks", "en-US", "auto");
        assert_eq!(pair.target, Language::Arabic);

        let pair = LanguagePair::resolve("thanks", "auto", "en");
        assert!(pair.is_identity());
        assert_eq!(pair.swapped(), pair);
    }

    #[test]
    fn names_and_speech_tags() {
        assert_eq!(Language::Arabic.name(), "Arabic");
        assert_eq!(Language::English.speech_tag(), "en-US");
        assert_eq!(display_name("auto", "مرحبا"), "Arabic");
        assert_eq!(display_name("en-GB", "مرحبا"), "English");
    }
}
