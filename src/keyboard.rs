use serde::{Deserialize, Serialize};

use crate::message::null_as_empty;

/// Default keyboard type understood by Kik.
pub const SUGGESTED: &str = "suggested";

/// A set of quick-reply buttons attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyboard {
    /// Only show the keyboard to this user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub keyboard_type: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub responses: Vec<KeyboardResponse>,
}

/// A single button in a [`Keyboard`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardResponse {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub response_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl Keyboard {
    pub fn suggested(responses: Vec<KeyboardResponse>) -> Self {
        Self {
            keyboard_type: Some(SUGGESTED.to_string()),
            responses,
            ..Default::default()
        }
    }

    /// Scope the keyboard to a single recipient.
    pub fn to(mut self, user: impl Into<String>) -> Self {
        self.to = Some(user.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = Some(true);
        self
    }
}

impl KeyboardResponse {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            response_type: Some("text".to_string()),
            body: Some(body.into()),
        }
    }
}
