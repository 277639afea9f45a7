/// Max characters of an upstream body carried into a user-facing message.
const BODY_PREVIEW_CHARS: usize = 500;

/// Why a generation call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// History had no user-authored turn; nothing was sent.
    NoUserTurn,
    /// DNS, connect, or mid-stream transport failure.
    NetworkUnavailable,
    /// Upstream answered with a non-2xx status (or streamed an error object).
    HttpStatus { status: u16 },
    /// 2xx response without the expected JSON shape.
    MalformedResponse,
    Unknown,
}

impl FailureKind {
    /// Short message safe to render inline in a chat transcript, built from a
    /// `Failed` event. Upstream bodies are cut to a bounded preview.
    pub fn user_message(&self, detail: &str) -> String {
        match self {
            Self::NoUserTurn => "nothing to send: the conversation has no user message".to_string(),
            Self::NetworkUnavailable => "could not reach the model endpoint".to_string(),
            Self::HttpStatus { status } => {
                let preview: String = detail.chars().take(BODY_PREVIEW_CHARS).collect();
                let suffix = if preview.len() < detail.len() { "..." } else { "" };
                format!("model endpoint returned HTTP {status}: {preview}{suffix}")
            }
            Self::MalformedResponse => {
                "the model returned a response that could not be read".to_string()
            }
            Self::Unknown => format!("request to model endpoint failed: {detail}"),
        }
    }
}

/// One item on the worker→controller channel.
///
/// A call produces zero or more `PartialAnswer` events followed by exactly one
/// terminal event (`Done`, `Failed` or `Cancelled`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationEvent {
    /// Accumulated answer and thought summary so far (not deltas).
    PartialAnswer {
        text: String,
        thought_summary: String,
    },
    Done,
    Failed { kind: FailureKind, detail: String },
    /// User-initiated stop. Not a failure.
    Cancelled,
}

impl GenerationEvent {
    /// `Done`, `Failed` and `Cancelled` end a call.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::PartialAnswer { .. })
    }
}
