// ABOUTME: Per-conversation message log kept in arrival order and de-duplicated by id.
// ABOUTME: First write wins; messages are never edited or removed once appended.

use std::collections::HashSet;

use crate::metrics;
use crate::model::Message;

/// Ordered, de-duplicated messages of one conversation
#[derive(Debug, Clone)]
pub struct MessageStream {
    conversation_id: String,
    messages: Vec<Message>,
    seen: HashSet<String>,
}

impl MessageStream {
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            messages: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// Replace the stream with fetched history, dropping repeated ids.
    ///
    /// Messages already in the stream that the history does not contain
    /// (pushed while the fetch was in flight) are kept after it. Returns the
    /// number of duplicates dropped from `history`.
    pub fn bootstrap(&mut self, history: Vec<Message>) -> usize {
        let live = std::mem::take(&mut self.messages);
        self.seen.clear();

        let mut dropped = 0;
        for message in history {
            if !self.push_unique(message) {
                dropped += 1;
            }
        }
        for message in live {
            self.push_unique(message);
        }

        metrics::record_duplicate_dropped(dropped as u64);
        if dropped > 0 {
            tracing::debug!(
                conversation = %self.conversation_id,
                dropped,
                "Dropped duplicate ids from history"
            );
        }
        dropped
    }

    /// Append a pushed message unless its id is already present
    pub fn append(&mut self, message: Message) -> bool {
        let appended = self.push_unique(message);
        if !appended {
            metrics::record_duplicate_dropped(1);
        }
        appended
    }

    fn push_unique(&mut self, message: Message) -> bool {
        if !self.seen.insert(message.id.clone()) {
            return false;
        }
        self.messages.push(message);
        true
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.seen.clear();
    }

    pub fn contains(&self, message_id: &str) -> bool {
        self.seen.contains(message_id)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
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
