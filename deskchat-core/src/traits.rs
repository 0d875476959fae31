// ABOUTME: Seams to the external collaborators: the REST backend and the realtime gateway.
// ABOUTME: Concrete adapters live in the deskchat binary crate; tests supply mocks.

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::events::{ClientEvent, ServerEvent};
use crate::model::{Conversation, CreateConversation, Message};

// =============================================================================
// REST backend
// =============================================================================

/// Read-side REST calls plus the idempotent create-or-get.
///
/// Sending messages is deliberately absent: the realtime path only sends
/// through the gateway.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Every conversation the admin can see
    async fn list_conversations(&self) -> Result<Vec<Conversation>>;

    /// Create the conversation if absent, otherwise return the existing one
    async fn create_conversation(&self, request: &CreateConversation) -> Result<Conversation>;

    /// History of one conversation, in backend order
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>>;
}

// =============================================================================
// Realtime gateway
// =============================================================================

/// One physical link to the gateway.
///
/// The connector owns the pumps behind these channels. Dropping `outbound`
/// closes the link; the link is gone once `inbound` yields `None`.
#[derive(Debug)]
pub struct Link {
    pub outbound: mpsc::Sender<ClientEvent>,
    pub inbound: mpsc::Receiver<ServerEvent>,
}

impl Link {
    /// Build a link plus the far ends of its channels, for in-process connectors
    pub fn pair(capacity: usize) -> (Self, mpsc::Receiver<ClientEvent>, mpsc::Sender<ServerEvent>) {
        let (out_tx, out_rx) = mpsc::channel(capacity);
        let (in_tx, in_rx) = mpsc::channel(capacity);
        (
            Self {
                outbound: out_tx,
                inbound: in_rx,
            },
            out_rx,
            in_tx,
        )
    }
}

/// Opens physical links; the connection manager decides when and how often.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Short transport name for logs (e.g., "websocket", "polling")
    fn transport_name(&self) -> &str;

    /// Perform one handshake and return the established link
    async fn open(&self) -> Result<Link>;
}
