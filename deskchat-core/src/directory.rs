// ABOUTME: Admin-side index of conversations with last-message and unread bookkeeping.
// ABOUTME: New conversations are prepended; entries are never removed locally.

use crate::model::{Conversation, Message};

/// Ordered list of conversation summaries, most recently announced first
#[derive(Debug, Clone, Default)]
pub struct ConversationDirectory {
    entries: Vec<Conversation>,
}

impl ConversationDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with a fresh REST snapshot
    pub fn replace_all(&mut self, conversations: Vec<Conversation>) {
        self.entries = conversations;
    }

    /// Prepend a pushed conversation unless one with the same id is known.
    ///
    /// Returns whether it was inserted. The existing entry is left untouched.
    pub fn upsert_from_push(&mut self, conversation: Conversation) -> bool {
        if self.contains(&conversation.id) {
            return false;
        }
        self.entries.insert(0, conversation);
        true
    }

    /// Fold an inbound message into its conversation's summary.
    ///
    /// Unread only grows for messages the admin has not written and is not
    /// currently looking at. Returns false when the conversation is unknown.
    pub fn apply_message(&mut self, message: &Message, selected: Option<&str>, admin_id: &str) -> bool {
        let Some(conv) = self.get_mut(&message.conversation_id) else {
            tracing::debug!(
                conversation = %message.conversation_id,
                "Message for conversation not in directory"
            );
            return false;
        };

        conv.last_message = Some(message.text.clone());
        conv.last_message_time = Some(message.created_at);
        if !message.is_from(admin_id) && selected != Some(message.conversation_id.as_str()) {
            conv.unread_count = conv.unread_count.saturating_add(1);
        }
        true
    }

    /// Zero the unread count of a conversation being opened
    pub fn mark_read(&mut self, conversation_id: &str) {
        if let Some(conv) = self.get_mut(conversation_id) {
            conv.unread_count = 0;
        }
    }

    pub fn get(&self, conversation_id: &str) -> Option<&Conversation> {
        self.entries.iter().find(|c| c.id == conversation_id)
    }

    fn get_mut(&mut self, conversation_id: &str) -> Option<&mut Conversation> {
        self.entries.iter_mut().find(|c| c.id == conversation_id)
    }

    pub fn contains(&self, conversation_id: &str) -> bool {
        self.get(conversation_id).is_some()
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of unread counts, for a badge
    pub fn total_unread(&self) -> u32 {
        self.entries
            .iter()
            .fold(0u32, |acc, c| acc.saturating_add(c.unread_count))
    }
}
