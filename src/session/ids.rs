//! Local message id generation
//!
//! Ids are a monotonic ULID followed by a role suffix, e.g.
//! `01J9ZQ3W5Y8C2N6V4K7T1R0M3B_user`. The ULID part sorts in generation
//! order even when several ids are produced in the same millisecond; the
//! suffix is for readability only.

use std::fmt;
use ulid::{Generator, Ulid};

/// What a generated id is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    /// Optimistic user message
    User,
    /// Assistant reply
    Reply,
    /// Local connection-error placeholder
    Error,
    /// History record without a backend timestamp
    History,
}

impl IdKind {
    fn suffix(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Reply => "bot",
            Self::Error => "error",
            Self::History => "history",
        }
    }
}

/// Generator of unique local message ids
pub struct MessageIdGenerator {
    generator: Generator,
}

impl MessageIdGenerator {
    /// Create a generator
    pub fn new() -> Self {
        Self {
            generator: Generator::new(),
        }
    }

    /// Produce the next id
    ///
    /// # Examples
    ///
    /// ```
    /// use mdchat::session::{IdKind, MessageIdGenerator};
    ///
    /// let mut ids = MessageIdGenerator::new();
    /// let a = ids.next_id(IdKind::User);
    /// let b = ids.next_id(IdKind::Reply);
    /// assert!(a.ends_with("_user"));
    /// assert!(b.ends_with("_bot"));
    /// assert_ne!(a, b);
    /// ```
    pub fn next_id(&mut self, kind: IdKind) -> String {
        // Overflow only happens after 2^80 ids in one millisecond.
        let ulid = self.generator.generate().unwrap_or_else(|_| Ulid::new());
        format!("{}_{}", ulid, kind.suffix())
    }
}

impl Default for MessageIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MessageIdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageIdGenerator").finish_non_exhaustive()
    }
}
