use thiserror::Error;

use crate::event::FailureKind;

#[derive(Debug, Error)]
pub enum ParleyError {
    #[error("history contains no user-authored turn")]
    NoUserTurn,

    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("cancelled")]
    Cancelled,

    #[error("a generation is already in flight on this handle")]
    Busy,

    #[error("config error: {0}")]
    Config(String),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

impl ParleyError {
    /// Classify into the failure taxonomy reported on the event channel.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NoUserTurn => FailureKind::NoUserTurn,
            Self::NetworkUnavailable(_) => FailureKind::NetworkUnavailable,
            Self::HttpStatus { status, .. } => FailureKind::HttpStatus { status: *status },
            Self::MalformedResponse(_) => FailureKind::MalformedResponse,
            Self::Request(e) => {
                // Connect covers DNS and refused; body/decode covers a dropped stream.
                if let Some(status) = e.status() {
                    FailureKind::HttpStatus {
                        status: status.as_u16(),
                    }
                } else if e.is_connect() || e.is_timeout() || e.is_body() || e.is_decode() {
                    FailureKind::NetworkUnavailable
                } else {
                    FailureKind::Unknown
                }
            }
            Self::Cancelled | Self::Busy | Self::Config(_) | Self::Other(_) => FailureKind::Unknown,
        }
    }

    /// Detail text carried by a `Failed` event.
    /// HTTP failures carry the raw body so callers can show the upstream reason.
    pub fn detail(&self) -> String {
        match self {
            Self::HttpStatus { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }

    /// Short message safe to render inline in a chat transcript.
    pub fn user_message(&self) -> String {
        match self {
            Self::Cancelled => "stopped".to_string(),
            Self::Busy => "a response is still being generated".to_string(),
            Self::Config(msg) => format!("configuration error: {msg}"),
            Self::Other(msg) => msg.clone(),
            _ => self.kind().user_message(&self.detail()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_detail_is_raw_body() {
        let err = ParleyError::HttpStatus {
            status: 429,
            body: "quota exceeded".to_string(),
        };
        assert_eq!(err.kind(), FailureKind::HttpStatus { status: 429 });
        assert_eq!(err.detail(), "quota exceeded");
    }

    #[test]
    fn user_message_truncates_long_bodies() {
        let err = ParleyError::HttpStatus {
            status: 500,
            body: "x".repeat(2000),
        };
        let msg = err.user_message();
        assert!(msg.starts_with("model endpoint returned HTTP 500: "));
        assert!(msg.ends_with("..."));
        assert!(msg.len() < 600);
    }

    #[test]
    fn handle_errors_have_their_own_messages() {
        assert_eq!(
            ParleyError::Busy.user_message(),
            "a response is still being generated"
        );
        assert_eq!(
            ParleyError::Config("no endpoint".into()).user_message(),
            "configuration error: no endpoint"
        );
    }

    #[test]
    fn local_failures_map_to_taxonomy() {
        assert_eq!(ParleyError::NoUserTurn.kind(), FailureKind::NoUserTurn);
        assert_eq!(
            ParleyError::MalformedResponse("x".into()).kind(),
            FailureKind::MalformedResponse
        );
        assert_eq!(ParleyError::Other("x".into()).kind(), FailureKind::Unknown);
    }
}
