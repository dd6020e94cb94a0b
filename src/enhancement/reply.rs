use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Value, json};
use std::marker::PhantomData;
use std::str::FromStr;

/// A reply shape the model is asked for. A JSON object counts as that shape when it
/// carries at least one of `FIELDS`.
pub trait ReplyShape: DeserializeOwned {
    const FIELDS: &'static [&'static str];
}

/// A model answer: the JSON object exactly as the model sent it, or `{"result": <text>}`
/// when the text was not an object of the requested shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply<T> {
    value: Value,
    raw: bool,
    shape: PhantomData<fn() -> T>,
}

impl<T: ReplyShape> ModelReply<T> {
    pub fn from_model_text(text: &str) -> Self {
        let value = parse_model_output(text);
        let expected = value
            .as_object()
            .is_some_and(|object| T::FIELDS.iter().any(|field| object.contains_key(*field)));
        if expected {
            Self {
                value,
                raw: false,
                shape: PhantomData,
            }
        } else {
            Self {
                value: json!({ "result": text }),
                raw: true,
                shape: PhantomData,
            }
        }
    }

    /// Typed reading of a parsed reply for rendering; fields the model got wrong are empty.
    pub fn view(&self) -> Option<T> {
        if self.raw {
            return None;
        }
        serde_json::from_value(self.value.clone()).ok()
    }
}

impl<T> ModelReply<T> {
    pub fn is_raw(&self) -> bool {
        self.raw
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn raw_text(&self) -> Option<&str> {
        if self.raw {
            self.value.get("result").and_then(Value::as_str)
        } else {
            None
        }
    }
}

impl<T> Serialize for ModelReply<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

/// The parsed JSON, or `{"result": <text>}` when the text is not JSON.
pub fn parse_model_output(text: &str) -> Value {
    serde_json::from_str(strip_code_fence(text)).unwrap_or_else(|_| json!({ "result": text }))
}

/// Removes a surrounding Markdown code fence (with or without a language tag).
pub fn strip_code_fence(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = match rest.split_once('\n') {
            Some((tag, remainder)) if tag.trim().chars().all(|ch| ch.is_ascii_alphanumeric()) => {
                remainder
            }
            Some(_) => rest,
            None => rest.trim_start_matches(|ch: char| ch.is_ascii_alphabetic()),
        };
    }
    body = body.trim_end();
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Enhancement {
    #[serde(default, deserialize_with = "lenient_string")]
    pub enhanced_translation: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cultural_notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub alternatives: Vec<String>,
    #[serde(default, deserialize_with = "lenient_level")]
    pub formality: Option<Formality>,
    #[serde(default, deserialize_with = "lenient_level")]
    pub confidence: Option<Confidence>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrammarExplanation {
    #[serde(default, deserialize_with = "lenient_list")]
    pub grammar_points: Vec<String>,
    #[serde(default, deserialize_with = "lenient_vocabulary")]
    pub vocabulary: Vec<VocabularyItem>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub learning_tips: Vec<String>,
    #[serde(default, deserialize_with = "lenient_level")]
    pub difficulty_level: Option<Difficulty>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VocabularyItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub word: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub meaning: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub usage: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PronunciationHelp {
    #[serde(default, deserialize_with = "lenient_string")]
    pub phonetic: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub pronunciation_tips: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub common_mistakes: Vec<String>,
}

impl ReplyShape for Enhancement {
    const FIELDS: &'static [&'static str] = &[
        "enhanced_translation",
        "cultural_notes",
        "alternatives",
        "formality",
        "confidence",
    ];
}

impl ReplyShape for GrammarExplanation {
    const FIELDS: &'static [&'static str] =
        &["grammar_points", "vocabulary", "learning_tips", "difficulty_level"];
}

impl ReplyShape for PronunciationHelp {
    const FIELDS: &'static [&'static str] =
        &["phonetic", "pronunciation_tips", "common_mistakes"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Formality {
    Formal,
    Informal,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl FromStr for Formality {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "formal" => Ok(Formality::Formal),
            "informal" => Ok(Formality::Informal),
            "neutral" => Ok(Formality::Neutral),
            _ => Err(()),
        }
    }
}

impl FromStr for Confidence {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "high" => Ok(Confidence::High),
            "medium" => Ok(Confidence::Medium),
            "low" => Ok(Confidence::Low),
            _ => Err(()),
        }
    }
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            _ => Err(()),
        }
    }
}

impl Formality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Formality::Formal => "formal",
            Formality::Informal => "informal",
            Formality::Neutral => "neutral",
        }
    }
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

// Models drift from the requested shape; a wrong field type only drops that field.

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

fn lenient_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(text) if !text.trim().is_empty() => Some(text),
                _ => None,
            })
            .collect(),
        Some(Value::String(text)) if !text.trim().is_empty() => vec![text],
        _ => Vec::new(),
    })
}

fn lenient_level<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => text.trim().to_lowercase().parse().ok(),
        _ => None,
    })
}

fn lenient_vocabulary<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<VocabularyItem>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}
