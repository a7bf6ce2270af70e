//! Backend module for MDChat
//!
//! This module contains the chat backend abstraction and its
//! implementations: an HTTP client for the MD Agents server and an
//! in-memory fake used by tests and offline sessions.

pub mod fake;
pub mod http;

pub use fake::FakeBackend;
pub use http::HttpBackend;

use crate::config::BackendConfig;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A conversation as reported by the backend's listing endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Backend-issued conversation id
    pub id: String,
    /// Title derived by the backend, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Creation time as reported by the backend, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// One stored message from a conversation's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// "user" or "assistant"
    pub role: String,
    /// Message text
    pub message: String,
    /// Backend timestamp, used as both display time and message id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Reply to a sent message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReply {
    /// Assistant reply text
    pub reply: String,
    /// Whether the backend routed the message through its medical agents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_medical: Option<bool>,
}

/// Chat backend trait
///
/// Every operation is a single request/response exchange. Any transport
/// failure, non-success status, or undecodable body must be returned as an
/// error for which [`crate::error::MdChatError::is_network`] holds;
/// implementations never panic on backend misbehavior.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Create a conversation and return its backend-issued id
    async fn create_conversation(&self) -> Result<String>;

    /// List conversations, most recent first
    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>>;

    /// Fetch the full history of a conversation in backend order
    async fn get_history(&self, conversation_id: &str) -> Result<Vec<HistoryRecord>>;

    /// Delete a conversation and its history
    async fn delete_conversation(&self, conversation_id: &str) -> Result<()>;

    /// Send a user message and wait for the assistant reply
    async fn send_message(&self, conversation_id: &str, message: &str) -> Result<SendReply>;

    /// Check that the backend is reachable
    ///
    /// Backends without a health endpoint are assumed healthy.
    async fn health(&self) -> Result<()> {
        Ok(())
    }
}

/// Create the HTTP backend described by configuration
///
/// # Errors
///
/// Returns error if the base URL is invalid or the HTTP client cannot be built
pub fn create_backend(config: &BackendConfig) -> Result<Box<dyn ChatBackend>> {
    Ok(Box::new(HttpBackend::new(config.clone())?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_backend_with_defaults() {
        let result = create_backend(&BackendConfig::default());
        assert!(result.is_ok());
    }

    #[test]
    fn test_create_backend_invalid_url() {
        let config = BackendConfig {
            base_url: "::not a url::".to_string(),
            timeout_seconds: 5,
        };
        assert!(create_backend(&config).is_err());
    }

    #[test]
    fn test_summary_optional_fields() {
        let summary: ConversationSummary = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        assert_eq!(summary.id, "abc");
        assert!(summary.title.is_none());
        assert!(summary.created_at.is_none());
    }

    #[test]
    fn test_history_record_parses_backend_shape() {
        let record: HistoryRecord = serde_json::from_str(
            r#"{"role": "assistant", "message": "Hi", "timestamp": "2025-01-01 10:00:00"}"#,
        )
        .unwrap();
        assert_eq!(record.role, "assistant");
        assert_eq!(record.timestamp.as_deref(), Some("2025-01-01 10:00:00"));
    }

    #[test]
    fn test_send_reply_without_medical_flag() {
        let reply: SendReply = serde_json::from_str(r#"{"reply": "Hi there"}"#).unwrap();
        assert_eq!(reply.reply, "Hi there");
        assert_eq!(reply.is_medical, None);
    }
}
