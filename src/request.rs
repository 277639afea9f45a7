use serde::Serialize;

use crate::attachment::{self, InlineData};
use crate::error::ParleyError;
use crate::history::{self, Turn};
use crate::provider::Provider;

/// Harm categories switched off when a provider takes safety thresholds.
const SAFETY_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_CIVIC_INTEGRITY",
];

/// `-1` asks the model for a dynamic, unbounded reasoning budget.
const UNBOUNDED_THINKING_BUDGET: i32 = -1;

/// Everything one generation call needs. Built fresh per call.
#[derive(Clone)]
pub struct GenerationRequest {
    pub history: Vec<Turn>,
    /// Model URL without the `:generateContent` style suffix.
    pub endpoint_base: String,
    pub provider: Provider,
    pub thinking_enabled: bool,
    pub streaming: bool,
    /// Already-resolved credential (API key or bearer token).
    pub api_key: String,
}

impl std::fmt::Debug for GenerationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationRequest")
            .field("turns", &self.history.len())
            .field("endpoint_base", &self.endpoint_base)
            .field("provider", &self.provider)
            .field("thinking_enabled", &self.thinking_enabled)
            .field("streaming", &self.streaming)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePayload {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_settings: Option<Vec<SafetySetting>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub role: &'static str,
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
pub struct SafetySetting {
    pub category: &'static str,
    pub threshold: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_budget: i32,
    pub include_thoughts: bool,
}

/// Turn a request into the provider's wire payload.
///
/// Leading model turns are dropped; a history without any user turn fails
/// with `NoUserTurn` before anything touches the network. Content blocks keep
/// the order of the input turns. Attachments that cannot be inlined are left
/// out of their turn (see [`attachment::encode`]).
pub async fn build(
    request: &GenerationRequest,
    max_attachment_bytes: u64,
) -> Result<WirePayload, ParleyError> {
    let turns = history::from_first_user_turn(&request.history).ok_or(ParleyError::NoUserTurn)?;
    let profile = request.provider.profile();

    let mut contents = Vec::with_capacity(turns.len());
    for turn in turns {
        let mut parts = Vec::with_capacity(1 + turn.attachments.len());
        parts.push(Part::Text {
            text: turn.text.clone(),
        });
        for path in &turn.attachments {
            if let Some(inline_data) = attachment::encode(path, max_attachment_bytes).await {
                parts.push(Part::Inline { inline_data });
            }
        }
        contents.push(Content {
            role: turn.role().as_str(),
            parts,
        });
    }

    let safety_settings = profile.supports_safety_block.then(|| {
        SAFETY_CATEGORIES
            .iter()
            .map(|&category| SafetySetting {
                category,
                threshold: "BLOCK_NONE",
            })
            .collect()
    });

    let generation_config =
        (request.thinking_enabled && profile.supports_thinking_block).then_some(GenerationConfig {
            thinking_config: ThinkingConfig {
                thinking_budget: UNBOUNDED_THINKING_BUDGET,
                include_thoughts: true,
            },
        });

    Ok(WirePayload {
        contents,
        safety_settings,
        generation_config,
    })
}
