//! Chunk-boundary behavior of the incremental JSON object extractor.

use parley::parsers::{Answer, JsonObjectStream};
use serde_json::{Value, json};

/// A realistic `streamGenerateContent` body: one array written progressively.
fn stream_body() -> String {
    let objects = [
        json!({"candidates":[{"content":{"role":"model","parts":[{"text":"Let me think {carefully}.","thought":true}]}}]}),
        json!({"candidates":[{"content":{"role":"model","parts":[{"text":"Braces: {\"a\": [1, 2]} and \\ slashes"}]}}]}),
        json!({"candidates":[{"content":{"role":"model","parts":[{"text":" done."}]},"finishReason":"STOP"}],"usageMetadata":{"totalTokenCount":42}}),
    ];
    let items: Vec<String> = objects.iter().map(|o| o.to_string()).collect();
    format!("[{}]", items.join("\r\n,"))
}

fn feed_in_chunks(body: &[u8], size: usize) -> Vec<Value> {
    let mut stream = JsonObjectStream::new();
    body.chunks(size).flat_map(|c| stream.feed(c)).collect()
}

#[test]
fn chunk_size_does_not_change_result() {
    let body = stream_body();
    let whole = feed_in_chunks(body.as_bytes(), body.len());
    assert_eq!(whole.len(), 3);

    for size in [1, 2, 3, 7, 16, 64] {
        assert_eq!(feed_in_chunks(body.as_bytes(), size), whole, "chunk size {size}");
    }
}

#[test]
fn objects_accumulate_into_answer() {
    let body = stream_body();
    let mut answer = Answer::default();
    for object in feed_in_chunks(body.as_bytes(), 5) {
        answer.absorb(object).unwrap();
    }
    assert_eq!(answer.thought_summary, "Let me think {carefully}.");
    assert_eq!(answer.text, "Braces: {\"a\": [1, 2]} and \\ slashes done.");
}

#[test]
fn two_objects_split_anywhere() {
    let input = b"{\"a\":1}{\"b\":2}";
    for split in 0..=input.len() {
        let mut stream = JsonObjectStream::new();
        let mut objects = stream.feed(&input[..split]);
        objects.extend(stream.feed(&input[split..]));
        assert_eq!(objects, vec![json!({"a": 1}), json!({"b": 2})]);
    }
}
