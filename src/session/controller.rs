//! Session controller
//!
//! [`SessionController`] owns the [`SessionState`] of one chat window and
//! performs every user-facing operation: startup, new chat, select chat,
//! delete chat, and send message. Backend failures never escape an
//! operation; they are logged and folded into state as a fallback (empty
//! history, local-only deletion) or as a visible assistant error message.
//!
//! The controller is borrowed mutably for the whole of each operation,
//! including the backend round trip, so two operations can never interleave
//! on one controller.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use crate::backend::{ChatBackend, HistoryRecord};
use crate::config::SessionConfig;

use super::ids::{IdKind, MessageIdGenerator};
use super::state::{Phase, SessionEvent, SessionState};
use super::{Conversation, ConversationId, Message, Role};

/// Result of a send attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Input was empty after trimming; nothing happened
    Ignored,
    /// There was no active conversation to send to
    NoActiveConversation,
    /// The backend replied
    Replied,
    /// The backend failed; an error message was appended
    Failed,
}

/// Result of a delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The backend confirmed the deletion
    Deleted,
    /// The backend call failed; the conversation was removed locally only
    LocalOnly,
}

/// Drives a chat session against a backend
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use mdchat::backend::FakeBackend;
/// use mdchat::config::SessionConfig;
/// use mdchat::session::{SendOutcome, SessionController};
///
/// # #[tokio::main]
/// # async fn main() {
/// let backend = Arc::new(FakeBackend::new());
/// backend.push_reply("Hi there");
///
/// let mut session = SessionController::new(backend, SessionConfig::default(), false);
/// session.startup().await;
///
/// assert_eq!(session.send_message("Hello").await, SendOutcome::Replied);
/// assert_eq!(session.state().messages.len(), 2);
/// assert_eq!(session.state().active_conversation().unwrap().title, "Hello");
/// # }
/// ```
pub struct SessionController {
    backend: Arc<dyn ChatBackend>,
    config: SessionConfig,
    state: SessionState,
    ids: MessageIdGenerator,
}

impl SessionController {
    /// Create a controller in the `Uninitialized` phase
    ///
    /// # Arguments
    ///
    /// * `backend` - Backend used for every operation
    /// * `config` - Session behavior settings
    /// * `logged_in` - Local logged-in flag read at startup
    pub fn new(backend: Arc<dyn ChatBackend>, config: SessionConfig, logged_in: bool) -> Self {
        Self {
            backend,
            config,
            state: SessionState::new(logged_in),
            ids: MessageIdGenerator::new(),
        }
    }

    /// Current state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    fn apply(&mut self, event: SessionEvent) {
        let state = std::mem::take(&mut self.state);
        self.state = state.apply(event);
    }

    /// Load conversations and make one active
    ///
    /// The most recent listed conversation becomes active. When the listing
    /// is empty or fails, a new conversation is created so the session never
    /// starts without one. Calling this again after startup has no effect.
    pub async fn startup(&mut self) {
        if self.state.phase != Phase::Uninitialized {
            tracing::debug!("Session already started");
            return;
        }

        tracing::info!("Starting chat session");
        self.apply(SessionEvent::LoadingStarted);

        match self.backend.list_conversations().await {
            Ok(summaries) if !summaries.is_empty() => {
                let conversations: Vec<Conversation> = summaries
                    .into_iter()
                    .map(|s| Conversation::from_summary(s, &self.config.default_title))
                    .collect();
                tracing::info!("Loaded {} conversations", conversations.len());
                let first = conversations[0].id.clone();
                self.apply(SessionEvent::ConversationsLoaded(conversations));
                self.activate(first).await;
            }
            Ok(_) => {
                tracing::info!("No conversations yet, creating one");
                self.create_new_chat().await;
            }
            Err(e) => {
                tracing::warn!("Failed to load conversations: {}", e);
                self.create_new_chat().await;
            }
        }

        self.apply(SessionEvent::Ready);
    }

    /// Create a conversation, put it first, and make it active
    ///
    /// Returns the new id, or `None` when the backend could not create one;
    /// in that case the state is unchanged.
    pub async fn create_new_chat(&mut self) -> Option<ConversationId> {
        match self.backend.create_conversation().await {
            Ok(id) => {
                let id = ConversationId::new(id);
                tracing::info!("Created conversation {}", id);
                let conversation = Conversation::new(id.clone(), self.config.default_title.clone());
                self.apply(SessionEvent::ConversationCreated(conversation));
                self.activate(id.clone()).await;
                Some(id)
            }
            Err(e) => {
                tracing::error!("Failed to create conversation: {}", e);
                None
            }
        }
    }

    /// Make a listed conversation active and load its history
    ///
    /// Re-selecting the active conversation re-fetches its history. Returns
    /// false, without changing state, for ids that are not listed.
    pub async fn select_chat(&mut self, id: &ConversationId) -> bool {
        if !self.state.contains(id) {
            tracing::warn!("Cannot select unknown conversation {}", id);
            return false;
        }
        self.activate(id.clone()).await;
        true
    }

    async fn activate(&mut self, id: ConversationId) {
        tracing::debug!("Activating conversation {}", id);
        self.apply(SessionEvent::Activated(id));
        self.load_history().await;
    }

    /// Replace messages with the active conversation's backend history
    ///
    /// On failure messages are cleared rather than left stale.
    pub async fn load_history(&mut self) {
        let Some(id) = self.state.active_id.clone() else {
            return;
        };

        match self.backend.get_history(id.as_str()).await {
            Ok(records) => {
                let messages = messages_from_history(records, &mut self.ids);
                tracing::debug!("Loaded {} messages for {}", messages.len(), id);
                self.apply(SessionEvent::HistoryLoaded(messages));
            }
            Err(e) => {
                tracing::warn!("History load failed for {}: {}", id, e);
                self.apply(SessionEvent::HistoryFailed);
            }
        }
    }

    /// Delete a conversation
    ///
    /// The conversation is removed locally even when the backend call fails.
    /// If it was active, the first other conversation becomes active, or a
    /// new conversation is created when none remain.
    pub async fn delete_chat(&mut self, id: &ConversationId) -> DeleteOutcome {
        let outcome = match self.backend.delete_conversation(id.as_str()).await {
            Ok(()) => {
                tracing::info!("Deleted conversation {}", id);
                DeleteOutcome::Deleted
            }
            Err(e) => {
                tracing::warn!(
                    "Backend deletion of {} failed, removing locally only: {}",
                    id,
                    e
                );
                DeleteOutcome::LocalOnly
            }
        };

        let was_active = self.state.active_id.as_ref() == Some(id);
        let next = self
            .state
            .conversations
            .iter()
            .find(|c| &c.id != id)
            .map(|c| c.id.clone());

        self.apply(SessionEvent::ConversationRemoved(id.clone()));

        if was_active {
            match next {
                Some(next) => self.activate(next).await,
                None => {
                    self.create_new_chat().await;
                }
            }
        }

        outcome
    }

    /// Send a message in the active conversation
    ///
    /// The user message is appended before the backend is called. The reply,
    /// or a fixed connection-error message, is appended after it. The first
    /// successful send in a default-titled conversation renames it to a
    /// prefix of `text`.
    pub async fn send_message(&mut self, text: &str) -> SendOutcome {
        if text.trim().is_empty() {
            return SendOutcome::Ignored;
        }

        let Some(conversation_id) = self.state.active_conversation().map(|c| c.id.clone()) else {
            tracing::warn!("No active conversation; message not sent");
            return SendOutcome::NoActiveConversation;
        };

        let user_message = Message::new(
            self.ids.next_id(IdKind::User),
            Role::User,
            text,
            Some(Utc::now().to_rfc3339()),
        );
        self.apply(SessionEvent::MessageAppended(user_message));
        self.apply(SessionEvent::SendStarted);

        let outcome = match self
            .backend
            .send_message(conversation_id.as_str(), text)
            .await
        {
            Ok(reply) => {
                tracing::debug!(
                    conversation = %conversation_id,
                    is_medical = ?reply.is_medical,
                    "Received reply"
                );
                let reply_message = Message::new(
                    self.ids.next_id(IdKind::Reply),
                    Role::Assistant,
                    reply.reply,
                    Some(Utc::now().to_rfc3339()),
                );
                self.apply(SessionEvent::MessageAppended(reply_message));
                self.rewrite_default_title(&conversation_id, text);
                SendOutcome::Replied
            }
            Err(e) => {
                tracing::warn!("Send failed for {}: {}", conversation_id, e);
                let error_message = Message::new(
                    self.ids.next_id(IdKind::Error),
                    Role::Assistant,
                    self.config.connection_error_message.clone(),
                    None,
                );
                self.apply(SessionEvent::MessageAppended(error_message));
                SendOutcome::Failed
            }
        };

        self.apply(SessionEvent::SendFinished);
        outcome
    }

    fn rewrite_default_title(&mut self, id: &ConversationId, text: &str) {
        let is_default = self
            .state
            .conversation(id)
            .is_some_and(|c| c.title == self.config.default_title);
        if !is_default {
            return;
        }

        let title: String = text.chars().take(self.config.title_max_chars).collect();
        tracing::debug!("Renaming conversation {} to {:?}", id, title);
        self.apply(SessionEvent::TitleRewritten {
            id: id.clone(),
            title,
        });
    }
}

/// Convert backend history into messages
///
/// The backend timestamp doubles as the message id. Records stored within
/// the same timestamp get a `#n` suffix so ids stay unique; records without
/// a timestamp get a generated id.
pub fn messages_from_history(
    records: Vec<HistoryRecord>,
    ids: &mut MessageIdGenerator,
) -> Vec<Message> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .map(|record| {
            let id = match &record.timestamp {
                Some(ts) => {
                    let mut candidate = ts.clone();
                    let mut n = 1;
                    while seen.contains(&candidate) {
                        n += 1;
                        candidate = format!("{}#{}", ts, n);
                    }
                    candidate
                }
                None => ids.next_id(IdKind::History),
            };
            seen.insert(id.clone());
            Message::new(
                id,
                Role::from_backend(&record.role),
                record.message,
                record.timestamp,
            )
        })
        .collect()
}
