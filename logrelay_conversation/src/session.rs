//! Owned conversation state.
//!
//! A `Conversation` wraps one `MessageLog` and serializes turns against it:
//! a turn holds the lock from the moment the prompt is appended until the
//! response is appended, so roles never interleave between callers.

use logrelay_core::{Error, Message, MessageLog, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

/// What a turn does when another turn is already in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentionMode {
    /// Wait for the in-flight turn to finish (FIFO).
    #[default]
    Queue,
    /// Fail immediately with `Error::Busy`.
    Reject,
}

#[derive(Debug)]
pub struct Conversation {
    id: Uuid,
    log: Mutex<MessageLog>,
    contention: ContentionMode,
}

/// Point-in-time figures about a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversationStats {
    pub messages: usize,
    pub total_length: usize,
    pub max_total_length: usize,
    pub evicted: u64,
}

impl Conversation {
    /// Create a conversation seeded with the context message.
    pub fn new(max_total_length: usize, context_message: &str) -> Result<Self> {
        if context_message.is_empty() {
            return Err(Error::invalid_input("context message must not be empty"));
        }
        let log = MessageLog::new(max_total_length, context_message)?;
        let id = Uuid::now_v7();
        debug!("Created conversation {id}");
        Ok(Self {
            id,
            log: Mutex::new(log),
            contention: ContentionMode::default(),
        })
    }

    #[must_use]
    pub const fn with_contention(mut self, contention: ContentionMode) -> Self {
        self.contention = contention;
        self
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn contention(&self) -> ContentionMode {
        self.contention
    }

    /// Acquire exclusive access to the log for one turn.
    pub async fn begin_turn(&self) -> Result<MutexGuard<'_, MessageLog>> {
        match self.contention {
            ContentionMode::Queue => Ok(self.log.lock().await),
            ContentionMode::Reject => self.log.try_lock().map_err(|_| Error::Busy),
        }
    }

    pub async fn snapshot(&self) -> Vec<Message> {
        self.log.lock().await.snapshot()
    }

    pub async fn texts(&self) -> Vec<String> {
        self.log.lock().await.texts()
    }

    pub async fn concatenated(&self) -> String {
        self.log.lock().await.concatenated()
    }

    pub async fn stats(&self) -> ConversationStats {
        let log = self.log.lock().await;
        ConversationStats {
            messages: log.len(),
            total_length: log.total_length(),
            max_total_length: log.max_total_length(),
            evicted: log.evicted(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_with_the_context_message() {
        let conversation = Conversation::new(100, "context").unwrap();
        assert_eq!(conversation.texts().await, vec!["context"]);
        let stats = conversation.stats().await;
        assert_eq!(stats.messages, 1);
        assert_eq!(stats.total_length, 7);
    }

    #[test]
    fn empty_context_is_rejected() {
        let err = Conversation::new(100, "").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn reject_mode_fails_while_a_turn_is_open() {
        let conversation = Conversation::new(100, "context")
            .unwrap()
            .with_contention(ContentionMode::Reject);

        let guard = conversation.begin_turn().await.unwrap();
        let second = conversation.begin_turn().await;
        assert!(matches!(second, Err(Error::Busy)));
        drop(guard);

        assert!(conversation.begin_turn().await.is_ok());
    }

    #[test]
    fn contention_mode_parses_lowercase() {
        let mode: ContentionMode = serde_json::from_str("\"reject\"").unwrap();
        assert_eq!(mode, ContentionMode::Reject);
    }
}
