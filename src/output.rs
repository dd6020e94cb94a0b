use crate::enhancement::{Enhancement, GrammarExplanation, ModelReply, PronunciationHelp};
use crate::error::TranslatorError;
use crate::history::HistoryEntry;
use crate::resolver::TranslationResult;

const UNAVAILABLE_SUFFIX: &str = " (translation unavailable)";

/// The text shown for a translation; a terminal miss shows the original, annotated.
pub fn display_translation(result: &TranslationResult) -> String {
    if result.is_miss() {
        format!("{}{}", result.text, UNAVAILABLE_SUFFIX)
    } else {
        result.text.clone()
    }
}

pub fn format_enhancement(reply: &ModelReply<Enhancement>, basic_translation: &str) -> String {
    let Some(enhancement) = reply.view() else {
        return unstructured(reply);
    };

    let mut output = String::new();
    output.push_str(
        enhancement
            .enhanced_translation
            .as_deref()
            .unwrap_or(basic_translation),
    );
    output.push('\n');
    if let Some(notes) = enhancement.cultural_notes.as_deref() {
        output.push_str("\nCultural notes:\n");
        output.push_str(notes);
        output.push('\n');
    }
    push_list(&mut output, "Alternatives", &enhancement.alternatives);
    output.push_str(&format!(
        "\nFormality: {}\nConfidence: {}\n",
        enhancement
            .formality
            .map(|value| value.as_str())
            .unwrap_or("neutral"),
        enhancement
            .confidence
            .map(|value| value.as_str())
            .unwrap_or("medium"),
    ));
    output.trim_end_matches('\n').to_string()
}

pub fn format_grammar(reply: &ModelReply<GrammarExplanation>) -> String {
    let Some(grammar) = reply.view() else {
        return unstructured(reply);
    };

    let mut output = String::new();
    push_list(&mut output, "Grammar points", &grammar.grammar_points);
    if !grammar.vocabulary.is_empty() {
        output.push_str("\nVocabulary:\n");
        for item in &grammar.vocabulary {
            output.push_str("- ");
            output.push_str(item.word.as_deref().unwrap_or("?"));
            if let Some(meaning) = item.meaning.as_deref() {
                output.push_str(": ");
                output.push_str(meaning);
            }
            if let Some(usage) = item.usage.as_deref() {
                output.push_str(&format!(" (e.g. {})", usage));
            }
            output.push('\n');
        }
    }
    push_list(&mut output, "Learning tips", &grammar.learning_tips);
    if let Some(level) = grammar.difficulty_level {
        output.push_str(&format!("\nDifficulty: {}\n", level.as_str()));
    }
    finish(output, reply)
}

pub fn format_pronunciation(reply: &ModelReply<PronunciationHelp>) -> String {
    let Some(help) = reply.view() else {
        return unstructured(reply);
    };

    let mut output = String::new();
    if let Some(phonetic) = help.phonetic.as_deref() {
        output.push_str(&format!("Phonetic: {}\n", phonetic));
    }
    push_list(&mut output, "Tips", &help.pronunciation_tips);
    push_list(&mut output, "Common mistakes", &help.common_mistakes);
    finish(output, reply)
}

pub fn format_error(err: &TranslatorError) -> String {
    format!("{}\nHint: {}", err, err.remediation_hint())
}

pub fn format_histories(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No translation history.".to_string();
    }
    entries
        .iter()
        .map(|entry| {
            format!(
                "[{}] {}->{}\n  {}\n  {}",
                entry.timestamp,
                entry.source_language,
                entry.target_language,
                entry.original_text,
                entry.translated_text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_list(output: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    if !output.is_empty() {
        output.push('\n');
    }
    output.push_str(title);
    output.push_str(":\n");
    for item in items {
        output.push_str("- ");
        output.push_str(item);
        output.push('\n');
    }
}

/// Nothing renderable from the typed view: show what the model sent instead.
fn finish<T>(output: String, reply: &ModelReply<T>) -> String {
    let trimmed = output.trim_matches('\n');
    if trimmed.is_empty() {
        unstructured(reply)
    } else {
        trimmed.to_string()
    }
}

fn unstructured<T>(reply: &ModelReply<T>) -> String {
    match reply.raw_text() {
        Some(text) => text.trim().to_string(),
        None => serde_json::to_string_pretty(reply.value())
            .unwrap_or_else(|_| reply.value().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_is_annotated() {
        let miss = TranslationResult::terminal_miss("x");
        assert_eq!(display_translation(&miss), "x (translation unavailable)");
        assert_eq!(display_translation(&TranslationResult::unchanged("y")), "y");
    }

    #[test]
    fn partial_enhancement_falls_back() {
        let reply = ModelReply::<Enhancement>::from_model_text(
            r#"{"alternatives":["Hi"],"formality":"informal"}"#,
        );
        insta::assert_snapshot!(format_enhancement(&reply, "Hello"), @r"
        Hello

        Alternatives:
        - Hi

        Formality: informal
        Confidence: medium
        ");

        let full = ModelReply::<Enhancement>::from_model_text(
            r#"{"enhanced_translation":"Hey there","confidence":"high"}"#,
        );
        assert!(format_enhancement(&full, "Hello").starts_with("Hey there\n"));
    }

    #[test]
    fn raw_replies_render_as_text() {
        let reply = ModelReply::<PronunciationHelp>::from_model_text(" just text \n");
        assert_eq!(format_pronunciation(&reply), "just text");
    }

    #[test]
    fn unrenderable_fields_show_the_model_json() {
        let text = r#"{"grammar_points":"","notes":"x"}"#;
        let reply = ModelReply::<GrammarExplanation>::from_model_text(text);
        assert_eq!(
            format_grammar(&reply),
            "{\n  \"grammar_points\": \"\",\n  \"notes\": \"x\"\n}"
        );
    }

    #[test]
    fn error_includes_hint() {
        let rendered = format_error(&TranslatorError::missing_credential());
        assert!(rendered.starts_with("Gemini API key is not configured\nHint: "));
        assert!(rendered.contains("--save-key"));
    }
}
