//! Bounded, ordered conversation buffer.
//!
//! The log keeps the sum of message lengths at or below a configured bound by
//! evicting the oldest entries after every append. The newest entry is never
//! evicted by its own append, so a single over-long message may exceed the
//! bound on its own.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// One conversational turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Insertion index, never reused or renumbered.
    pub index: u64,
    pub text: String,
    pub appended_at: DateTime<Utc>,
}

impl Message {
    /// Character count used for eviction accounting.
    #[must_use]
    pub fn length(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone)]
pub struct MessageLog {
    entries: VecDeque<Message>,
    max_total_length: usize,
    total_length: usize,
    next_index: u64,
    evicted: u64,
}

impl MessageLog {
    /// Create a log holding only the seed (context) message.
    pub fn new(max_total_length: usize, seed: &str) -> Result<Self> {
        let mut log = Self::empty(max_total_length);
        log.append(seed)?;
        Ok(log)
    }

    #[must_use]
    pub const fn empty(max_total_length: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_total_length,
            total_length: 0,
            next_index: 0,
            evicted: 0,
        }
    }

    /// Append `text` at the tail, then evict from the head until the bound holds.
    pub fn append(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Err(Error::invalid_input("message text must not be empty"));
        }

        let message = Message {
            index: self.next_index,
            text: text.to_string(),
            appended_at: Utc::now(),
        };
        self.next_index += 1;
        self.total_length += message.length();
        self.entries.push_back(message);

        self.evict();
        Ok(())
    }

    fn evict(&mut self) {
        while self.total_length > self.max_total_length && self.entries.len() > 1 {
            let Some(removed) = self.entries.pop_front() else {
                break;
            };
            self.total_length -= removed.length();
            self.evicted += 1;
            debug!(
                "Evicted message {} ({} chars), total now {}/{}",
                removed.index,
                removed.length(),
                self.total_length,
                self.max_total_length
            );
        }
    }

    /// Ordered copy of the current entries.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Message> {
        self.entries.iter().cloned().collect()
    }

    /// Plain texts of the current entries, in order.
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        self.entries.iter().map(|m| m.text.clone()).collect()
    }

    /// All texts joined without a separator.
    #[must_use]
    pub fn concatenated(&self) -> String {
        self.entries.iter().map(|m| m.text.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn total_length(&self) -> usize {
        self.total_length
    }

    #[must_use]
    pub const fn max_total_length(&self) -> usize {
        self.max_total_length
    }

    /// Number of messages evicted since creation.
    #[must_use]
    pub const fn evicted(&self) -> u64 {
        self.evicted
    }
}
