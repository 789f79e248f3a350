//! Append-only session transcript

use super::emoji::expand_shortcodes;
use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};

/// Display format for message timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Who produced a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    #[allow(dead_code)] // Rendered but not produced by the chat flow
    System,
    #[allow(dead_code)] // Rendered but not produced by the chat flow
    Rating,
}

impl Role {
    /// Heading used when rendering the entry
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::System => "System",
            Role::Rating => "Rating",
        }
    }
}

/// A single transcript entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Local>,
}

impl Message {
    /// Build a message stamped now, with emoji shorthand expanded
    pub fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: expand_shortcodes(content).into_owned(),
            timestamp: Local::now(),
        }
    }

    /// Render as `**Role (timestamp):** content`
    pub fn render(&self) -> String {
        format!(
            "**{} ({}):** {}",
            self.role.label(),
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.content
        )
    }
}

pub(crate) fn serialize_timestamp<S: Serializer>(
    timestamp: &DateTime<Local>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&timestamp.format(TIMESTAMP_FORMAT))
}

/// Ordered, append-only message log
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Append a message. Timestamps never go backwards: if the wall clock
    /// stepped back, the message takes its predecessor's timestamp.
    pub fn append(&mut self, mut message: Message) -> &Message {
        if let Some(last) = self.last() {
            if message.timestamp < last.timestamp {
                message.timestamp = last.timestamp;
            }
        }
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// Snapshot of every message in display order
    pub fn all(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}
