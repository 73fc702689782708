//! Session data model: messages, qualification state, contact info.
//!
//! A session keeps a bounded history. After every append the history is
//! trimmed back to the first message plus the most recent turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of messages kept in a session history
pub const MAX_HISTORY: usize = 20;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Contact fields as submitted by the visitor. Form widgets send numbers
/// for phone fields, so any scalar is accepted and kept as its text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetails {
    #[serde(default, deserialize_with = "loose_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub best_time: Option<String>,
}

fn loose_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

/// Stored contact info, stamped on submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub best_time: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl ContactInfo {
    pub fn from_details(details: ContactDetails, submitted_at: DateTime<Utc>) -> Self {
        Self {
            name: details.name,
            phone: details.phone,
            email: details.email,
            best_time: details.best_time,
            submitted_at,
        }
    }
}

/// Lead qualification state mined from the conversation.
///
/// All text fields are loose free text exactly as the assistant phrased them.
/// `property_type` is part of the wire format but nothing fills it yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub budget: Option<String>,
    pub preferred_location: Option<String>,
    pub property_type: Option<String>,
    pub timeline: Option<String>,
    pub ready_to_contact: bool,
    pub contact_info: Option<ContactInfo>,
}

/// One visitor's conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub messages: Vec<Message>,
    pub user_data: UserData,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
            user_data: UserData::default(),
            created_at: Utc::now(),
        }
    }

    /// Append a message and trim the history.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.trim_history();
    }

    pub fn has_system_message(&self) -> bool {
        self.messages.iter().any(|m| m.role == Role::System)
    }

    /// Put a system message at the front unless one is already present.
    /// Returns true if the message was inserted.
    pub fn ensure_system_message(&mut self, prompt: impl Into<String>) -> bool {
        if self.has_system_message() {
            return false;
        }
        self.messages.insert(0, Message::system(prompt));
        self.trim_history();
        true
    }

    /// Keep [first message, last MAX_HISTORY - 1 messages] once over the cap.
    pub fn trim_history(&mut self) {
        let len = self.messages.len();
        if len <= MAX_HISTORY {
            return;
        }
        let tail_start = len - (MAX_HISTORY - 1);
        let first = self.messages[0].clone();
        let mut kept = Vec::with_capacity(MAX_HISTORY);
        kept.push(first);
        kept.extend(self.messages.drain(tail_start..));
        self.messages = kept;
    }

    /// Visible conversation: every non-system message in order.
    pub fn conversation(&self) -> Vec<Message> {
        self.messages
            .iter()
            .filter(|m| m.role != Role::System)
            .cloned()
            .collect()
    }
}
