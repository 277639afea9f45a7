use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

/// One message in a conversation. The worker only reads turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub text: String,
    pub is_authored_by_user: bool,
    /// File paths inlined as attachments, in order.
    #[serde(default)]
    pub attachments: Vec<PathBuf>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_authored_by_user: true,
            attachments: Vec::new(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_authored_by_user: false,
            attachments: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachments.push(path.into());
        self
    }

    pub fn role(&self) -> Role {
        if self.is_authored_by_user {
            Role::User
        } else {
            Role::Model
        }
    }
}

/// Drop every leading turn before the first user-authored one.
/// Returns `None` when the history has no user turn at all.
pub fn from_first_user_turn(history: &[Turn]) -> Option<&[Turn]> {
    let first = history.iter().position(|t| t.is_authored_by_user)?;
    Some(&history[first..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_model_turns_are_dropped() {
        let history = vec![
            Turn::model("greeting"),
            Turn::model("more greeting"),
            Turn::user("question"),
            Turn::model("answer"),
            Turn::user("follow-up"),
        ];
        let kept = from_first_user_turn(&history).unwrap();
        assert_eq!(kept.len(), 3);
        assert!(kept[0].is_authored_by_user);
        assert_eq!(kept[0].text, "question");
        assert_eq!(kept[2].text, "follow-up");
    }

    #[test]
    fn history_starting_with_user_is_untouched() {
        let history = vec![Turn::user("a"), Turn::model("b")];
        assert_eq!(from_first_user_turn(&history).unwrap(), &history[..]);
    }

    #[test]
    fn no_user_turn_yields_none() {
        assert!(from_first_user_turn(&[]).is_none());
        assert!(from_first_user_turn(&[Turn::model("only me")]).is_none());
    }
}
