use serde::Deserialize;
use serde_json::Value;

use crate::error::ParleyError;
use crate::event::GenerationEvent;

/// One `generateContent` response object (or one element of the streamed array).
/// Expected shape: `{"candidates":[{"content":{"parts":[{"text":"...","thought":true}]}}]}`
#[derive(Deserialize)]
struct ResponseObject {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: Option<bool>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Answer and thought-summary accumulators for one call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub thought_summary: String,
}

impl Answer {
    /// Fold one response object into the accumulators.
    ///
    /// Only `candidates[0].content.parts` is read: parts flagged `thought` go to
    /// the thought summary, every other text part to the answer. Returns
    /// `Ok(false)` for objects with no parts (usage or finish-reason trailers).
    /// An object carrying a top-level `error` becomes `HttpStatus`.
    pub fn absorb(&mut self, object: Value) -> Result<bool, ParleyError> {
        let object: ResponseObject = serde_json::from_value(object)
            .map_err(|e| ParleyError::MalformedResponse(format!("unexpected response shape: {e}")))?;

        if let Some(err) = object.error {
            let message = err
                .message
                .or(err.status)
                .unwrap_or_else(|| "upstream error".to_string());
            return Err(match err.code {
                Some(status) => ParleyError::HttpStatus {
                    status,
                    body: message,
                },
                None => ParleyError::Other(message),
            });
        }

        let Some(parts) = object
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
        else {
            return Ok(false);
        };

        for part in parts {
            let Some(text) = part.text else {
                continue;
            };
            if part.thought == Some(true) {
                self.thought_summary.push_str(&text);
            } else {
                self.text.push_str(&text);
            }
        }
        Ok(true)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.thought_summary.is_empty()
    }

    pub fn to_event(&self) -> GenerationEvent {
        GenerationEvent::PartialAnswer {
            text: self.text.clone(),
            thought_summary: self.thought_summary.clone(),
        }
    }
}

/// Parse a complete non-streaming response body.
/// Accepts a single object, or an array of objects as written by the streaming endpoint.
pub fn parse_document(body: &[u8]) -> Result<Answer, ParleyError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ParleyError::MalformedResponse(format!("response is not JSON: {e}")))?;

    let objects = match value {
        Value::Array(items) => items,
        other => vec![other],
    };

    let mut answer = Answer::default();
    let mut saw_parts = false;
    for object in objects {
        saw_parts |= answer.absorb(object)?;
    }

    if !saw_parts {
        return Err(ParleyError::MalformedResponse(
            "response has no candidates[0].content.parts".to_string(),
        ));
    }
    Ok(answer)
}
