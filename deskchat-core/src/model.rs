// ABOUTME: Conversation and message records exchanged with the support backend.
// ABOUTME: Field names follow the backend's JSON (camelCase, `_id` identifiers).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix used for conversations opened from an order's claim page
pub const ORDER_CONVERSATION_PREFIX: &str = "order_";

/// Derive the conversation id for an order's support chat.
///
/// This is the only addressing scheme customers have: opening the chat for the
/// same order always lands in the same conversation.
pub fn conversation_id_for_order(order_id: &str) -> String {
    format!("{}{}", ORDER_CONVERSATION_PREFIX, order_id)
}

/// Lifecycle status of a support conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    #[default]
    Active,
    Pending,
    Resolved,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Resolved => "resolved",
        }
    }
}

/// Summary of one chat thread between a customer and the admin role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub status: ConversationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_time: Option<DateTime<Utc>>,
    /// Unread messages from the admin's point of view
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Conversation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            participants: Vec::new(),
            status: ConversationStatus::default(),
            last_message: None,
            last_message_time: None,
            unread_count: 0,
            created_at: None,
            updated_at: None,
        }
    }

    /// Whether this conversation was opened from an order claim
    pub fn order_id(&self) -> Option<&str> {
        self.id.strip_prefix(ORDER_CONVERSATION_PREFIX)
    }
}

/// Kind of content a message carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    File,
}

/// A message confirmed by the backend.
///
/// The id is always server-assigned; the client never fabricates one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
    #[serde(default)]
    pub message_type: MessageKind,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn is_from(&self, sender_id: &str) -> bool {
        self.sender_id == sender_id
    }
}

/// Body of the create-or-get call that makes sure a conversation exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversation {
    pub conversation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<String>,
}
