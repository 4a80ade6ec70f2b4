//! Message model for the chat timeline.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Who authored a message, seen from the local participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Typed by the local participant.
    Outgoing,
    /// Delivered by the system.
    Incoming,
}

impl Direction {
    /// CSS class used for the rendered entry.
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Outgoing => "myMessage",
            Self::Incoming => "fromThem",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Outgoing => write!(f, "outgoing"),
            Self::Incoming => write!(f, "incoming"),
        }
    }
}

/// A chat message. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Raw text as typed or delivered (not escaped).
    pub text: String,
    /// Whether the message went out or came in.
    pub direction: Direction,
    /// When the message was submitted or delivered.
    pub timestamp: DateTime<Local>,
}

impl Message {
    pub fn outgoing(text: impl Into<String>, timestamp: DateTime<Local>) -> Self {
        Self {
            text: text.into(),
            direction: Direction::Outgoing,
            timestamp,
        }
    }

    pub fn incoming(text: impl Into<String>, timestamp: DateTime<Local>) -> Self {
        Self {
            text: text.into(),
            direction: Direction::Incoming,
            timestamp,
        }
    }

    /// Timestamp in milliseconds since the epoch, as sent over RPC.
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}
