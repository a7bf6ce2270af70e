//! Session state and its reducer
//!
//! [`SessionState`] is a plain value. Every transition is a
//! [`SessionEvent`] folded in by [`SessionState::apply`], which consumes the
//! old state and returns the new one without touching the network, so the
//! session invariants can be checked without a backend.

use serde::Serialize;

use super::{Conversation, ConversationId, Message};

/// Lifecycle phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Startup has not begun
    #[default]
    Uninitialized,
    /// The conversation list is being fetched
    Loading,
    /// Startup finished; the session accepts user actions
    Ready,
}

/// A single state transition
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Startup began
    LoadingStarted,
    /// Replace the conversation list with the backend listing
    ConversationsLoaded(Vec<Conversation>),
    /// Prepend a freshly created conversation
    ConversationCreated(Conversation),
    /// Make a known conversation active and discard current messages
    Activated(ConversationId),
    /// Replace messages with fetched history
    HistoryLoaded(Vec<Message>),
    /// History fetch failed; messages become empty
    HistoryFailed,
    /// Drop a conversation from the list
    ConversationRemoved(ConversationId),
    /// Append one message
    MessageAppended(Message),
    /// A send is in flight
    SendStarted,
    /// The in-flight send resolved
    SendFinished,
    /// Replace a conversation's title
    TitleRewritten {
        /// Conversation to rename
        id: ConversationId,
        /// New title
        title: String,
    },
    /// Startup finished
    Ready,
}

/// Everything the UI renders
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionState {
    /// Lifecycle phase
    pub phase: Phase,
    /// Conversations, most recent first
    pub conversations: Vec<Conversation>,
    /// Active conversation; always an element of `conversations` when set
    pub active_id: Option<ConversationId>,
    /// Messages of the active conversation
    pub messages: Vec<Message>,
    /// A send is awaiting its reply
    pub pending: bool,
    /// Local logged-in flag read at startup
    pub logged_in: bool,
}

impl SessionState {
    /// Create an uninitialized state
    pub fn new(logged_in: bool) -> Self {
        Self {
            logged_in,
            ..Self::default()
        }
    }

    /// Apply one event and return the resulting state
    ///
    /// Events that would break an invariant (activating an unknown id) leave
    /// the state unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use mdchat::session::{Conversation, SessionEvent, SessionState};
    ///
    /// let state = SessionState::new(false)
    ///     .apply(SessionEvent::ConversationCreated(Conversation::new("c1", "New Chat")))
    ///     .apply(SessionEvent::Activated("c1".into()));
    /// assert_eq!(state.active_conversation().unwrap().title, "New Chat");
    /// ```
    pub fn apply(mut self, event: SessionEvent) -> Self {
        match event {
            SessionEvent::LoadingStarted => {
                self.phase = Phase::Loading;
            }
            SessionEvent::ConversationsLoaded(conversations) => {
                self.conversations = conversations;
                if let Some(active) = &self.active_id {
                    if !self.contains(active) {
                        self.active_id = None;
                        self.messages.clear();
                    }
                }
            }
            SessionEvent::ConversationCreated(conversation) => {
                self.conversations.retain(|c| c.id != conversation.id);
                self.conversations.insert(0, conversation);
            }
            SessionEvent::Activated(id) => {
                if self.contains(&id) {
                    self.active_id = Some(id);
                    self.messages.clear();
                }
            }
            SessionEvent::HistoryLoaded(messages) => {
                self.messages = messages;
            }
            SessionEvent::HistoryFailed => {
                self.messages.clear();
            }
            SessionEvent::ConversationRemoved(id) => {
                self.conversations.retain(|c| c.id != id);
                if self.active_id.as_ref() == Some(&id) {
                    self.active_id = None;
                    self.messages.clear();
                }
            }
            SessionEvent::MessageAppended(message) => {
                self.messages.push(message);
            }
            SessionEvent::SendStarted => {
                self.pending = true;
            }
            SessionEvent::SendFinished => {
                self.pending = false;
            }
            SessionEvent::TitleRewritten { id, title } => {
                if let Some(conversation) = self.conversations.iter_mut().find(|c| c.id == id) {
                    conversation.title = title;
                }
            }
            SessionEvent::Ready => {
                self.phase = Phase::Ready;
            }
        }
        self
    }

    /// Whether `id` is in the conversation list
    pub fn contains(&self, id: &ConversationId) -> bool {
        self.conversations.iter().any(|c| &c.id == id)
    }

    /// Look up a conversation by id
    pub fn conversation(&self, id: &ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| &c.id == id)
    }

    /// The active conversation, if any
    pub fn active_conversation(&self) -> Option<&Conversation> {
        self.active_id.as_ref().and_then(|id| self.conversation(id))
    }

    /// Startup has finished
    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }

    /// A send is in flight
    pub fn is_sending(&self) -> bool {
        self.pending
    }
}
