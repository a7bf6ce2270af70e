//! Chat session management
//!
//! This module holds the client-side model of a chat session:
//!
//! - `state`: the immutable [`SessionState`] value and its reducer
//! - `controller`: [`SessionController`], which talks to the backend and
//!   folds responses into state
//! - `ids`: collision-free local message ids

pub mod controller;
pub mod ids;
pub mod state;

pub use controller::{messages_from_history, DeleteOutcome, SendOutcome, SessionController};
pub use ids::{IdKind, MessageIdGenerator};
pub use state::{Phase, SessionEvent, SessionState};

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::backend::ConversationSummary;

/// Backend-issued conversation identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Wrap a backend id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ConversationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ConversationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A conversation shown in the sidebar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Backend-issued id
    pub id: ConversationId,
    /// Display title
    pub title: String,
    /// Creation time, when known
    pub created_at: Option<DateTime<Utc>>,
}

impl Conversation {
    /// Create a conversation stamped with the current time
    pub fn new(id: impl Into<ConversationId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            created_at: Some(Utc::now()),
        }
    }

    /// Build a conversation from a backend listing entry
    ///
    /// Missing or blank titles fall back to `default_title`; creation times
    /// that are not RFC 3339 are dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use mdchat::backend::ConversationSummary;
    /// use mdchat::session::Conversation;
    ///
    /// let summary = ConversationSummary {
    ///     id: "abc".to_string(),
    ///     title: None,
    ///     created_at: Some("2025-03-01T12:00:00Z".to_string()),
    /// };
    /// let conversation = Conversation::from_summary(summary, "New Chat");
    /// assert_eq!(conversation.title, "New Chat");
    /// assert!(conversation.created_at.is_some());
    /// ```
    pub fn from_summary(summary: ConversationSummary, default_title: &str) -> Self {
        let title = summary
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| default_title.to_string());
        let created_at = summary
            .created_at
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc));

        Self {
            id: ConversationId::new(summary.id),
            title,
            created_at,
        }
    }
}

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person typing
    User,
    /// The backend assistant
    Assistant,
}

impl Role {
    /// Map a backend role string; anything other than "user" is the assistant
    pub fn from_backend(role: &str) -> Self {
        if role.eq_ignore_ascii_case("user") {
            Self::User
        } else {
            Self::Assistant
        }
    }

    /// Speaker label used in transcripts
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "AI",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One chat message
///
/// Messages are never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique within the in-memory sequence
    pub id: String,
    /// Author
    pub role: Role,
    /// Message text
    pub content: String,
    /// ISO-8601 timestamp; absent on local error placeholders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Message {
    /// Create a message
    pub fn new(
        id: impl Into<String>,
        role: Role,
        content: impl Into<String>,
        timestamp: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            role,
            content: content.into(),
            timestamp,
        }
    }

    /// Wall-clock `HH:MM` of the timestamp, if it parses
    ///
    /// RFC 3339 timestamps are shown in local time; zone-less backend
    /// timestamps are shown as written.
    pub fn clock_time(&self) -> Option<String> {
        let ts = self.timestamp.as_deref()?.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(ts) {
            return Some(parsed.with_timezone(&Local).format("%H:%M").to_string());
        }
        ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(ts, fmt).ok())
            .map(|parsed| parsed.format("%H:%M").to_string())
    }
}
