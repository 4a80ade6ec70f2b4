//! Message updates delivered on a participant's channel.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Delivery status of a message update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageStatus {
    /// Authored by the system; the only status that is rendered.
    SentBySystem,
    SentByServer,
    SentByUser,
    AnsweredByUser,
    NotAnsweredByUser,
    /// Any status this client does not know.
    Other(String),
}

impl MessageStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::SentBySystem => "SENT_BY_SYSTEM",
            Self::SentByServer => "SENT_BY_SERVER",
            Self::SentByUser => "SENT_BY_USER",
            Self::AnsweredByUser => "ANSWERED_BY_USER",
            Self::NotAnsweredByUser => "NOT_ANSWERED_BY_USER",
            Self::Other(s) => s,
        }
    }

    /// Parse a status string; unknown values are kept verbatim.
    pub fn parse(s: &str) -> Self {
        match s {
            "SENT_BY_SYSTEM" => Self::SentBySystem,
            "SENT_BY_SERVER" => Self::SentByServer,
            "SENT_BY_USER" => Self::SentByUser,
            "ANSWERED_BY_USER" => Self::AnsweredByUser,
            "NOT_ANSWERED_BY_USER" => Self::NotAnsweredByUser,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MessageStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MessageStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// An item delivered on `message-update/<user>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageUpdate {
    /// Backend message id (numeric or string depending on the server).
    #[serde(default)]
    pub id: Option<Value>,
    pub status: MessageStatus,
    /// Message text; absent for pure status changes.
    #[serde(default)]
    pub message: Option<String>,
    /// Message type (`PLAIN`, `INTENTION`, `COMMAND`).
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl MessageUpdate {
    /// A system-authored update carrying `message`.
    pub fn from_system(message: impl Into<String>) -> Self {
        Self {
            id: None,
            status: MessageStatus::SentBySystem,
            message: Some(message.into()),
            kind: None,
        }
    }

    /// Parse a raw channel payload.
    pub fn parse(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    /// Text to render, if this update should appear in the timeline.
    pub fn renderable_text(&self) -> Option<&str> {
        match self.status {
            MessageStatus::SentBySystem => self.message.as_deref(),
            _ => None,
        }
    }
}
