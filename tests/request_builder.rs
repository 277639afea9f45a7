//! Tests for turning a transcript into the provider wire payload.

use parley::error::ParleyError;
use parley::request::{self, GenerationRequest};
use parley::{Provider, Turn};

const NO_LIMIT: u64 = u64::MAX;

fn make_req(history: Vec<Turn>, provider: Provider, thinking: bool) -> GenerationRequest {
    GenerationRequest {
        history,
        endpoint_base: "http://127.0.0.1:1/v1beta/models/test".to_string(),
        provider,
        thinking_enabled: thinking,
        streaming: true,
        api_key: "fake".to_string(),
    }
}

async fn payload_json(req: &GenerationRequest) -> serde_json::Value {
    let payload = request::build(req, NO_LIMIT).await.unwrap();
    serde_json::to_value(&payload).unwrap()
}

// ---------------------------------------------------------------------------
// History truncation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn history_without_user_turn_fails() {
    for history in [vec![], vec![Turn::model("hello"), Turn::model("anyone?")]] {
        let req = make_req(history, Provider::GoogleAiStudio, false);
        let err = request::build(&req, NO_LIMIT).await.unwrap_err();
        assert!(matches!(err, ParleyError::NoUserTurn), "got {err:?}");
    }
}

#[tokio::test]
async fn leading_model_turns_are_dropped() {
    let req = make_req(
        vec![
            Turn::model("Hi! How can I help?"),
            Turn::user("What is Rust?"),
            Turn::model("A systems language."),
            Turn::user("Why?"),
        ],
        Provider::GoogleAiStudio,
        false,
    );
    let body = payload_json(&req).await;
    let contents = body["contents"].as_array().unwrap();

    assert_eq!(contents.len(), 3);
    assert_eq!(contents[0]["role"], "user");
    assert_eq!(contents[0]["parts"][0]["text"], "What is Rust?");
    assert_eq!(contents[1]["role"], "model");
    assert_eq!(contents[1]["parts"][0]["text"], "A systems language.");
    assert_eq!(contents[2]["role"], "user");
    assert_eq!(contents[2]["parts"][0]["text"], "Why?");
}

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_attachment_is_omitted_others_kept() {
    let dir = std::env::temp_dir().join("parley-test-attachments");
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let present = dir.join("notes.txt");
    tokio::fs::write(&present, b"hello").await.unwrap();
    let missing = dir.join("gone.png");
    let _ = tokio::fs::remove_file(&missing).await;
    let unknown = dir.join("data.bin");
    tokio::fs::write(&unknown, b"\x00\x01").await.unwrap();

    let turn = Turn::user("see files")
        .with_attachment(&missing)
        .with_attachment(&present)
        .with_attachment(&unknown);
    let req = make_req(vec![turn], Provider::GoogleAiStudio, false);
    let body = payload_json(&req).await;
    let parts = body["contents"][0]["parts"].as_array().unwrap();

    assert_eq!(parts.len(), 2, "text + one inline part, got {parts:?}");
    assert_eq!(parts[0]["text"], "see files");
    assert_eq!(parts[1]["inlineData"]["mimeType"], "text/plain");
    assert_eq!(parts[1]["inlineData"]["data"], "aGVsbG8=");

    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[tokio::test]
async fn attachments_follow_text_in_order() {
    let dir = std::env::temp_dir().join("parley-test-attachment-order");
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let first = dir.join("a.csv");
    let second = dir.join("b.json");
    tokio::fs::write(&first, b"x,y").await.unwrap();
    tokio::fs::write(&second, b"{}").await.unwrap();

    let req = make_req(
        vec![Turn::user("compare").with_attachment(&first).with_attachment(&second)],
        Provider::VertexAi,
        false,
    );
    let body = payload_json(&req).await;
    let parts = body["contents"][0]["parts"].as_array().unwrap();

    assert_eq!(parts.len(), 3);
    assert_eq!(parts[1]["inlineData"]["mimeType"], "text/csv");
    assert_eq!(parts[2]["inlineData"]["mimeType"], "application/json");

    let _ = tokio::fs::remove_dir_all(&dir).await;
}

// ---------------------------------------------------------------------------
// Provider feature blocks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn google_providers_disable_all_safety_categories() {
    for provider in [Provider::GoogleAiStudio, Provider::VertexAi] {
        let body = payload_json(&make_req(vec![Turn::user("q")], provider, false)).await;
        let settings = body["safetySettings"].as_array().unwrap();
        assert!(!settings.is_empty());
        assert!(settings.iter().all(|s| s["threshold"] == "BLOCK_NONE"));
        assert!(
            settings
                .iter()
                .any(|s| s["category"] == "HARM_CATEGORY_DANGEROUS_CONTENT")
        );
    }
}

#[tokio::test]
async fn generic_provider_sends_no_feature_blocks() {
    let body = payload_json(&make_req(vec![Turn::user("q")], Provider::Generic, true)).await;
    assert!(body.get("safetySettings").is_none());
    assert!(body.get("generationConfig").is_none());
}

#[tokio::test]
async fn thinking_requests_unbounded_budget_and_summaries() {
    let body = payload_json(&make_req(vec![Turn::user("q")], Provider::GoogleAiStudio, true)).await;
    let thinking = &body["generationConfig"]["thinkingConfig"];
    assert_eq!(thinking["thinkingBudget"], -1);
    assert_eq!(thinking["includeThoughts"], true);
}

#[tokio::test]
async fn thinking_disabled_omits_generation_config() {
    let body = payload_json(&make_req(vec![Turn::user("q")], Provider::VertexAi, false)).await;
    assert!(body.get("generationConfig").is_none());
}

#[test]
fn request_debug_redacts_key() {
    let req = make_req(vec![Turn::user("q")], Provider::GoogleAiStudio, false);
    let debug = format!("{req:?}");
    assert!(debug.contains("[REDACTED]"));
    assert!(!debug.contains("fake"));
}
