mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use arabic_translator_rust::enhancement::{Confidence, Formality};
use arabic_translator_rust::settings::Settings;
use arabic_translator_rust::{EnhancementClient, EnhancementRequest, Gemini, TranslatorError};
use common::mock;

fn client(api_url: &str, key: Option<&str>) -> EnhancementClient {
    let mut settings = Settings::default().gemini;
    settings.api_url = api_url.to_string();
    let gemini = Gemini::new(reqwest::Client::new(), settings).with_key(key.map(str::to_string));
    EnhancementClient::new(gemini)
}

fn candidate(text: &str) -> String {
    json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] }).to_string()
}

fn request() -> EnhancementRequest {
    EnhancementRequest {
        original_text: "السلام عليكم".to_string(),
        translated_text: "Peace be upon you".to_string(),
        source_lang_name: "Arabic".to_string(),
        target_lang_name: "English".to_string(),
    }
}

#[tokio::test]
async fn missing_credential_makes_no_request() {
    let (api, hits) = mock(StatusCode::OK, &candidate("{}")).await;
    let client = client(&api, None);

    let err = client.enhance(&request()).await.unwrap_err();
    assert!(err.is_configuration());
    assert!(err.remediation_hint().contains("API key"));
    assert!(client.explain_grammar("hello", "English").await.is_err());
    assert_eq!(hits.count(), 0);
}

#[tokio::test]
async fn fenced_json_reply_is_parsed() {
    let reply = "```json\n{\"enhanced_translation\":\"Peace be with you\",\"cultural_notes\":\"A standard Islamic greeting.\",\"alternatives\":[\"Hello\"],\"formality\":\"formal\",\"confidence\":\"high\"}\n```";
    let (api, hits) = mock(StatusCode::OK, &candidate(reply)).await;
    let client = client(&api, Some("test-key"));

    let reply = client.enhance(&request()).await.unwrap();
    assert!(!reply.is_raw());
    assert_eq!(
        serde_json::to_value(&reply).unwrap(),
        json!({
            "enhanced_translation": "Peace be with you",
            "cultural_notes": "A standard Islamic greeting.",
            "alternatives": ["Hello"],
            "formality": "formal",
            "confidence": "high"
        })
    );
    let enhancement = reply.view().unwrap();
    assert_eq!(
        enhancement.enhanced_translation.as_deref(),
        Some("Peace be with you")
    );
    assert_eq!(enhancement.alternatives, vec!["Hello".to_string()]);
    assert_eq!(enhancement.formality, Some(Formality::Formal));
    assert_eq!(enhancement.confidence, Some(Confidence::High));

    assert_eq!(hits.count(), 1);
    assert_eq!(
        hits.uris()[0],
        "/gemini-2.0-flash-exp:generateContent?key=test-key"
    );
    let body: Value = serde_json::from_str(&hits.bodies()[0]).unwrap();
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("Original Arabic: \"السلام عليكم\""));
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
    assert_eq!(body["safetySettings"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn unparseable_reply_is_returned_as_result() {
    let text = "The word is pronounced mar-ha-ban.";
    let (api, _) = mock(StatusCode::OK, &candidate(text)).await;
    let client = client(&api, Some("test-key"));

    let reply = client.pronunciation_help("مرحبا", "Arabic").await.unwrap();
    assert!(reply.is_raw());
    assert_eq!(serde_json::to_value(&reply).unwrap(), json!({ "result": text }));
}

#[tokio::test]
async fn grammar_reply_is_returned_as_sent() {
    let text = r#"{"grammar_points":["Verb-subject-object order"],"difficulty_level":"expert","notes":"extra"}"#;
    let (api, _) = mock(StatusCode::OK, &candidate(text)).await;
    let client = client(&api, Some("test-key"));

    let reply = client.explain_grammar("ذهب الولد", "Arabic").await.unwrap();
    assert_eq!(
        serde_json::to_value(&reply).unwrap(),
        serde_json::from_str::<Value>(text).unwrap()
    );
    let grammar = reply.view().unwrap();
    assert_eq!(grammar.grammar_points, vec!["Verb-subject-object order".to_string()]);
    assert!(grammar.vocabulary.is_empty());
    assert_eq!(grammar.difficulty_level, None);
}

#[tokio::test]
async fn reply_of_another_shape_keeps_the_model_text() {
    let text = r#"{"translation":"Peace be with you"}"#;
    let (api, _) = mock(StatusCode::OK, &candidate(text)).await;
    let client = client(&api, Some("test-key"));

    let reply = client.enhance(&request()).await.unwrap();
    assert!(reply.is_raw());
    assert_eq!(reply.raw_text(), Some(text));
}

#[tokio::test]
async fn non_success_status_is_a_provider_error() {
    let body = r#"{"error":{"code":403,"message":"API key not valid","status":"PERMISSION_DENIED"}}"#;
    let (api, hits) = mock(StatusCode::FORBIDDEN, body).await;
    let client = client(&api, Some("bad-key"));

    let err = client.enhance(&request()).await.unwrap_err();
    match &err {
        TranslatorError::Provider { status, body } => {
            assert_eq!(*status, 403);
            assert!(body.contains("API key not valid"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.remediation_hint().contains("valid"));
    assert_eq!(hits.count(), 1);
}

#[tokio::test]
async fn empty_candidates_are_an_invalid_response() {
    let (api, _) = mock(StatusCode::OK, r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).await;
    let client = client(&api, Some("test-key"));

    let err = client.pronunciation_help("hello", "English").await.unwrap_err();
    assert!(matches!(err, TranslatorError::InvalidResponse(_)));
}
