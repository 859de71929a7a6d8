use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::keyboard::Keyboard;

/// Kik sends `null` for empty arrays; treat it like a missing key.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Message type discriminator. Types this crate does not model are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageType {
    Text,
    Picture,
    Link,
    Other(String),
}

impl MessageType {
    pub fn as_str(&self) -> &str {
        match self {
            MessageType::Text => "text",
            MessageType::Picture => "picture",
            MessageType::Link => "link",
            MessageType::Other(s) => s,
        }
    }
}

impl From<String> for MessageType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "text" => MessageType::Text,
            "picture" => MessageType::Picture,
            "link" => MessageType::Link,
            _ => MessageType::Other(s),
        }
    }
}

impl From<MessageType> for String {
    fn from(t: MessageType) -> Self {
        match t {
            MessageType::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content attribution shown on picture and link messages.
///
/// Kik accepts either a `{name, iconUrl}` object or one of the built-in tags
/// `gallery` and `camera`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attribution {
    Structured(StructuredAttribution),
    Named(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredAttribution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "iconUrl", default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl Attribution {
    pub fn gallery() -> Self {
        Attribution::Named("gallery".to_string())
    }

    pub fn camera() -> Self {
        Attribution::Named("camera".to_string())
    }

    pub fn structured(name: impl Into<String>, icon_url: impl Into<String>) -> Self {
        Attribution::Structured(StructuredAttribution {
            name: Some(name.into()),
            icon_url: Some(icon_url.into()),
        })
    }
}

/// An inbound or outbound chat message. Fields that do not apply to a given
/// message type are left as `None` and omitted from the wire form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<MessageType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub participants: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Milliseconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_receipt_requested: Option<bool>,
    #[serde(rename = "mentions", default, skip_serializing_if = "Option::is_none")]
    pub mention: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_time: Option<u32>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub keyboards: Vec<Keyboard>,

    // Pictures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pic_url: Option<String>,

    // Links
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<Attribution>,
}

impl Message {
    pub fn text(chat_id: impl Into<String>, to: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            message_type: Some(MessageType::Text),
            chat_id: Some(chat_id.into()),
            to: Some(to.into()),
            body: Some(body.into()),
            ..Default::default()
        }
    }

    pub fn picture(
        chat_id: impl Into<String>,
        to: impl Into<String>,
        pic_url: impl Into<String>,
        attribution: Option<Attribution>,
    ) -> Self {
        Self {
            message_type: Some(MessageType::Picture),
            chat_id: Some(chat_id.into()),
            to: Some(to.into()),
            pic_url: Some(pic_url.into()),
            attribution,
            ..Default::default()
        }
    }

    pub fn link(chat_id: impl Into<String>, to: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            message_type: Some(MessageType::Link),
            chat_id: Some(chat_id.into()),
            to: Some(to.into()),
            url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboards.push(keyboard);
        self
    }

    pub fn is_text(&self) -> bool {
        self.message_type == Some(MessageType::Text)
    }

    /// The message timestamp as a UTC datetime, if present and in range.
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.and_then(DateTime::from_timestamp_millis)
    }
}
