// ABOUTME: Shared mocks for deskchat-core integration tests
// ABOUTME: In-process gateway connector and a canned REST backend

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use deskchat_core::events::{ClientEvent, ServerEvent};
use deskchat_core::model::{Conversation, CreateConversation, Message};
use deskchat_core::traits::{ChatBackend, Connector, Link};
use tokio::sync::mpsc;

// =============================================================================
// Fixtures
// =============================================================================

pub fn message(id: &str, conversation_id: &str, sender_id: &str, text: &str) -> Message {
    Message {
        id: id.to_string(),
        conversation_id: conversation_id.to_string(),
        sender_id: sender_id.to_string(),
        text: text.to_string(),
        attachment_url: None,
        message_type: Default::default(),
        is_read: false,
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
    }
}

pub fn conversation(id: &str, unread: u32) -> Conversation {
    let mut conv = Conversation::new(id);
    conv.unread_count = unread;
    conv
}

// =============================================================================
// Gateway
// =============================================================================

/// Far side of one link, as the gateway sees it
pub struct GatewayPeer {
    pub from_client: mpsc::Receiver<ClientEvent>,
    pub to_client: mpsc::Sender<ServerEvent>,
}

impl GatewayPeer {
    pub async fn next_event(&mut self) -> ClientEvent {
        tokio::time::timeout(Duration::from_secs(5), self.from_client.recv())
            .await
            .expect("timed out waiting for client event")
            .expect("link closed")
    }

    pub async fn push(&self, event: ServerEvent) {
        self.to_client.send(event).await.expect("client gone");
    }
}

/// Connector whose links are plain channels handed to the test
pub struct MockConnector {
    name: String,
    peers: mpsc::UnboundedSender<GatewayPeer>,
    opens: Arc<AtomicUsize>,
    failures_left: AtomicUsize,
    always_fail: AtomicBool,
    hang: bool,
}

impl MockConnector {
    pub fn new(name: &str) -> (Arc<Self>, mpsc::UnboundedReceiver<GatewayPeer>) {
        let (peers, rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            name: name.to_string(),
            peers,
            opens: Arc::new(AtomicUsize::new(0)),
            failures_left: AtomicUsize::new(0),
            always_fail: AtomicBool::new(false),
            hang: false,
        });
        (connector, rx)
    }

    /// Connector that refuses every handshake
    pub fn failing(name: &str) -> Arc<Self> {
        let (connector, _rx) = Self::new(name);
        connector.always_fail.store(true, Ordering::SeqCst);
        connector
    }

    /// Connector whose handshake never completes
    pub fn hanging(name: &str) -> Arc<Self> {
        let (peers, _rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            name: name.to_string(),
            peers,
            opens: Arc::new(AtomicUsize::new(0)),
            failures_left: AtomicUsize::new(0),
            always_fail: AtomicBool::new(false),
            hang: true,
        })
    }

    pub fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MockConnector {
    fn transport_name(&self) -> &str {
        &self.name
    }

    async fn open(&self) -> anyhow::Result<Link> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.always_fail.load(Ordering::SeqCst) {
            anyhow::bail!("connection refused");
        }
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            anyhow::bail!("connection refused");
        }

        let (link, from_client, to_client) = Link::pair(64);
        let _ = self.peers.send(GatewayPeer {
            from_client,
            to_client,
        });
        Ok(link)
    }
}

pub async fn next_peer(peers: &mut mpsc::UnboundedReceiver<GatewayPeer>) -> GatewayPeer {
    tokio::time::timeout(Duration::from_secs(5), peers.recv())
        .await
        .expect("timed out waiting for a link")
        .expect("connector dropped")
}

// =============================================================================
// REST backend
// =============================================================================

#[derive(Default)]
pub struct MockBackend {
    pub conversations: Mutex<Vec<Conversation>>,
    pub messages: Mutex<HashMap<String, Vec<Message>>>,
    pub created: Mutex<Vec<CreateConversation>>,
    pub history_requests: Mutex<Vec<String>>,
    pub list_calls: AtomicUsize,
    pub fail_history: AtomicBool,
    pub fail_create: AtomicBool,
}

impl MockBackend {
    pub fn with_conversations(conversations: Vec<Conversation>) -> Arc<Self> {
        let backend = Self::default();
        *backend.conversations.lock().unwrap() = conversations;
        Arc::new(backend)
    }

    pub fn set_history(&self, conversation_id: &str, messages: Vec<Message>) {
        self.messages
            .lock()
            .unwrap()
            .insert(conversation_id.to_string(), messages);
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn list_conversations(&self) -> anyhow::Result<Vec<Conversation>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.conversations.lock().unwrap().clone())
    }

    async fn create_conversation(&self, request: &CreateConversation) -> anyhow::Result<Conversation> {
        self.created.lock().unwrap().push(request.clone());
        if self.fail_create.load(Ordering::SeqCst) {
            anyhow::bail!("backend unavailable");
        }
        Ok(Conversation::new(request.conversation_id.clone()))
    }

    async fn list_messages(&self, conversation_id: &str) -> anyhow::Result<Vec<Message>> {
        self.history_requests
            .lock()
            .unwrap()
            .push(conversation_id.to_string());
        if self.fail_history.load(Ordering::SeqCst) {
            anyhow::bail!("backend unavailable");
        }
        Ok(self
            .messages
            .lock()
            .unwrap()
            .get(conversation_id)
            .cloned()
            .unwrap_or_default())
    }
}
