//! In-memory fake backend for session tests
//!
//! [`FakeBackend`] stores conversations in process memory and behaves like
//! the MD Agents server: new conversations are listed most recent first,
//! sent messages are recorded in history, and listing derives titles from
//! the first user message. Tests can make any operation fail on demand and
//! inspect the calls that were made.
//!
//! # Example
//!
//! ```
//! use mdchat::backend::{ChatBackend, FakeBackend};
//! use mdchat::backend::fake::Operation;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let backend = FakeBackend::new();
//! backend.push_reply("Hi there");
//!
//! let id = backend.create_conversation().await.unwrap();
//! let reply = backend.send_message(&id, "Hello").await.unwrap();
//! assert_eq!(reply.reply, "Hi there");
//!
//! backend.fail(Operation::Send);
//! assert!(backend.send_message(&id, "again").await.is_err());
//! # }
//! ```

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::backend::{ChatBackend, ConversationSummary, HistoryRecord, SendReply};
use crate::error::{MdChatError, Result};

/// Backend operations, used for failure injection and call inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `create_conversation`
    Create,
    /// `list_conversations`
    List,
    /// `get_history`
    History,
    /// `delete_conversation`
    Delete,
    /// `send_message`
    Send,
    /// `health`
    Health,
}

#[derive(Debug, Clone)]
struct FakeConversation {
    id: String,
    history: Vec<HistoryRecord>,
}

#[derive(Debug, Default)]
struct FakeState {
    conversations: Vec<FakeConversation>,
    next_id: u64,
    next_timestamp: u64,
    failures: HashSet<Operation>,
    replies: VecDeque<String>,
    calls: Vec<Operation>,
    sent: Vec<(String, String)>,
}

impl FakeState {
    fn timestamp(&mut self) -> String {
        self.next_timestamp += 1;
        format!("2025-01-01T00:00:00.{:06}Z", self.next_timestamp)
    }
}

/// In-memory chat backend
#[derive(Debug, Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    /// Create an empty backend with no conversations
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an existing conversation
    ///
    /// Conversations added later are listed first, matching the backend's
    /// most-recent-first ordering.
    pub fn with_conversation(self, id: impl Into<String>, history: Vec<HistoryRecord>) -> Self {
        self.lock().conversations.insert(
            0,
            FakeConversation {
                id: id.into(),
                history,
            },
        );
        self
    }

    /// Make every subsequent call of `operation` fail
    pub fn fail(&self, operation: Operation) {
        self.lock().failures.insert(operation);
    }

    /// Let `operation` succeed again
    pub fn recover(&self, operation: Operation) {
        self.lock().failures.remove(&operation);
    }

    /// Queue a reply for the next `send_message`; unqueued sends echo
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.lock().replies.push_back(reply.into());
    }

    /// All calls made so far, in order
    pub fn calls(&self) -> Vec<Operation> {
        self.lock().calls.clone()
    }

    /// Number of calls made for one operation
    pub fn call_count(&self, operation: Operation) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| **call == operation)
            .count()
    }

    /// `(conversation_id, message)` pairs received by `send_message`
    pub fn sent_messages(&self) -> Vec<(String, String)> {
        self.lock().sent.clone()
    }

    /// Ids of stored conversations, most recent first
    pub fn conversation_ids(&self) -> Vec<String> {
        self.lock()
            .conversations
            .iter()
            .map(|c| c.id.clone())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record the call and return the injected failure, if any
    fn enter(&self, operation: Operation) -> Result<MutexGuard<'_, FakeState>> {
        let mut state = self.lock();
        state.calls.push(operation);
        if state.failures.contains(&operation) {
            return Err(MdChatError::Network(format!("injected {:?} failure", operation)).into());
        }
        Ok(state)
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn create_conversation(&self) -> Result<String> {
        let mut state = self.enter(Operation::Create)?;
        state.next_id += 1;
        let id = format!("chat-{}", state.next_id);
        state.conversations.insert(
            0,
            FakeConversation {
                id: id.clone(),
                history: Vec::new(),
            },
        );
        Ok(id)
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>> {
        let state = self.enter(Operation::List)?;
        Ok(state
            .conversations
            .iter()
            .map(|c| ConversationSummary {
                id: c.id.clone(),
                title: c
                    .history
                    .iter()
                    .find(|r| r.role == "user")
                    .map(|r| r.message.chars().take(50).collect()),
                created_at: None,
            })
            .collect())
    }

    async fn get_history(&self, conversation_id: &str) -> Result<Vec<HistoryRecord>> {
        let state = self.enter(Operation::History)?;
        Ok(state
            .conversations
            .iter()
            .find(|c| c.id == conversation_id)
            .map(|c| c.history.clone())
            .unwrap_or_default())
    }

    async fn delete_conversation(&self, conversation_id: &str) -> Result<()> {
        let mut state = self.enter(Operation::Delete)?;
        state.conversations.retain(|c| c.id != conversation_id);
        Ok(())
    }

    async fn send_message(&self, conversation_id: &str, message: &str) -> Result<SendReply> {
        let mut state = self.enter(Operation::Send)?;
        state
            .sent
            .push((conversation_id.to_string(), message.to_string()));

        let reply = state
            .replies
            .pop_front()
            .unwrap_or_else(|| format!("Echo: {}", message));

        let user_ts = state.timestamp();
        let reply_ts = state.timestamp();
        if let Some(conversation) = state
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
        {
            conversation.history.push(HistoryRecord {
                role: "user".to_string(),
                message: message.to_string(),
                timestamp: Some(user_ts),
            });
            conversation.history.push(HistoryRecord {
                role: "assistant".to_string(),
                message: reply.clone(),
                timestamp: Some(reply_ts),
            });
        }

        Ok(SendReply {
            reply,
            is_medical: Some(false),
        })
    }

    async fn health(&self) -> Result<()> {
        drop(self.enter(Operation::Health)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_lists_most_recent_first() {
        let backend = FakeBackend::new();
        let first = backend.create_conversation().await.unwrap();
        let second = backend.create_conversation().await.unwrap();

        let listed = backend.list_conversations().await.unwrap();
        let ids: Vec<_> = listed.iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[tokio::test]
    async fn test_send_records_history_and_title() {
        let backend = FakeBackend::new();
        let id = backend.create_conversation().await.unwrap();
        backend.push_reply("Hi there");

        let reply = backend.send_message(&id, "Hello").await.unwrap();
        assert_eq!(reply.reply, "Hi there");

        let history = backend.get_history(&id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, "user");
        assert_eq!(history[1].message, "Hi there");
        assert_ne!(history[0].timestamp, history[1].timestamp);

        let listed = backend.list_conversations().await.unwrap();
        assert_eq!(listed[0].title.as_deref(), Some("Hello"));
    }

    #[tokio::test]
    async fn test_unqueued_send_echoes() {
        let backend = FakeBackend::new();
        let reply = backend.send_message("missing", "ping").await.unwrap();
        assert_eq!(reply.reply, "Echo: ping");
    }

    #[tokio::test]
    async fn test_failure_injection_and_recovery() {
        let backend = FakeBackend::new();
        backend.fail(Operation::List);
        let err = backend.list_conversations().await.unwrap_err();
        assert!(err.to_string().contains("injected"));

        backend.recover(Operation::List);
        assert!(backend.list_conversations().await.is_ok());
        assert_eq!(backend.call_count(Operation::List), 2);
    }

    #[tokio::test]
    async fn test_delete_removes_conversation() {
        let backend = FakeBackend::new().with_conversation("a", Vec::new());
        backend.delete_conversation("a").await.unwrap();
        assert!(backend.conversation_ids().is_empty());
        assert_eq!(backend.calls(), vec![Operation::Delete]);
    }

    #[tokio::test]
    async fn test_health_releases_state_and_honors_failures() {
        let backend = FakeBackend::new();
        assert!(backend.health().await.is_ok());
        // The state lock must be free again after a health call.
        assert!(backend.create_conversation().await.is_ok());

        backend.fail(Operation::Health);
        assert!(backend.health().await.is_err());
        assert_eq!(backend.call_count(Operation::Health), 2);
    }

    #[tokio::test]
    async fn test_history_of_unknown_conversation_is_empty() {
        let backend = FakeBackend::new();
        assert!(backend.get_history("nope").await.unwrap().is_empty());
    }
}
