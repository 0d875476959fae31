// ABOUTME: Customer chat session for one order: create-or-get, history, join, send.
// ABOUTME: A pure state machine; the widget driver executes the effects it returns.

use crate::events::{describe_error, ClientEvent, OutgoingMessage, ServerEvent, TransportEvent};
use crate::metrics;
use crate::model::{conversation_id_for_order, Conversation, CreateConversation, Message};
use crate::stream::MessageStream;

/// Where the customer's chat is in its open sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for the gateway (first connect or reconnect)
    Connecting,
    EnsuringConversation,
    LoadingHistory,
    Live,
    Closed,
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    Transport(TransportEvent),
    ConversationReady {
        generation: u64,
        conversation: Conversation,
    },
    ConversationFailed {
        generation: u64,
        error: String,
    },
    HistoryLoaded {
        generation: u64,
        messages: Vec<Message>,
    },
    HistoryFailed {
        generation: u64,
        error: String,
    },
    Draft(String),
    Submit,
    Send(String),
    /// Pushed events were missed; reload the history
    Resync,
    Close,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    Emit(ClientEvent),
    EnsureConversation {
        request: CreateConversation,
        generation: u64,
    },
    FetchHistory {
        conversation_id: String,
        generation: u64,
    },
    /// Tear down the widget's own connection
    Disconnect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub order_id: String,
    pub conversation_id: String,
    pub phase: SessionPhase,
    pub connected: bool,
    pub messages: Vec<Message>,
    pub draft: String,
}

/// One customer's support chat for one order
#[derive(Debug, Clone)]
pub struct CustomerSession {
    order_id: String,
    user_id: String,
    admin_id: String,
    conversation_id: String,
    stream: MessageStream,
    phase: SessionPhase,
    connected: bool,
    /// Bumped on every (re)connect and on close; tags in-flight REST calls
    generation: u64,
    draft: String,
}

impl CustomerSession {
    pub fn open(order_id: impl Into<String>, user_id: impl Into<String>, admin_id: impl Into<String>) -> Self {
        let order_id = order_id.into();
        let conversation_id = conversation_id_for_order(&order_id);
        Self {
            stream: MessageStream::new(conversation_id.clone()),
            order_id,
            user_id: user_id.into(),
            admin_id: admin_id.into(),
            conversation_id,
            phase: SessionPhase::Connecting,
            connected: false,
            generation: 0,
            draft: String::new(),
        }
    }

    pub fn handle(&mut self, event: SessionEvent) -> Vec<SessionEffect> {
        if self.phase == SessionPhase::Closed {
            return Vec::new();
        }

        match event {
            SessionEvent::Transport(event) => self.on_transport(event),
            SessionEvent::ConversationReady {
                generation,
                conversation,
            } => {
                if generation != self.generation {
                    return Vec::new();
                }
                tracing::debug!(conversation = %conversation.id, status = conversation.status.as_str(), "Conversation ready");
                self.fetch_history()
            }
            SessionEvent::ConversationFailed { generation, error } => {
                if generation != self.generation {
                    return Vec::new();
                }
                metrics::record_bootstrap_failure("create");
                tracing::warn!(conversation = %self.conversation_id, %error, "Create-or-get failed, loading history anyway");
                self.fetch_history()
            }
            SessionEvent::HistoryLoaded {
                generation,
                messages,
            } => {
                if generation != self.generation {
                    return Vec::new();
                }
                self.stream.bootstrap(messages);
                if self.phase == SessionPhase::Live {
                    return Vec::new();
                }
                self.go_live()
            }
            SessionEvent::HistoryFailed { generation, error } => {
                if generation != self.generation {
                    return Vec::new();
                }
                metrics::record_bootstrap_failure("history");
                tracing::warn!(conversation = %self.conversation_id, %error, "Failed to load history");
                if self.phase == SessionPhase::Live {
                    return Vec::new();
                }
                self.go_live()
            }
            SessionEvent::Draft(text) => {
                self.draft = text;
                Vec::new()
            }
            SessionEvent::Submit => {
                let draft = self.draft.clone();
                let effects = self.send(&draft);
                if !effects.is_empty() {
                    self.draft.clear();
                }
                effects
            }
            SessionEvent::Send(text) => self.send(&text),
            SessionEvent::Resync => self.resync(),
            SessionEvent::Close => self.close(),
        }
    }

    fn on_transport(&mut self, event: TransportEvent) -> Vec<SessionEffect> {
        match event {
            TransportEvent::Connected => {
                if self.connected {
                    return Vec::new();
                }
                self.connected = true;
                self.generation += 1;
                self.phase = SessionPhase::EnsuringConversation;
                vec![SessionEffect::EnsureConversation {
                    request: CreateConversation {
                        conversation_id: self.conversation_id.clone(),
                        user_id: Some(self.user_id.clone()),
                        admin_id: Some(self.admin_id.clone()),
                    },
                    generation: self.generation,
                }]
            }
            TransportEvent::Disconnected { reason } => {
                tracing::info!(conversation = %self.conversation_id, %reason, "Support chat disconnected");
                self.connected = false;
                self.phase = SessionPhase::Connecting;
                Vec::new()
            }
            TransportEvent::Server(ServerEvent::ReceiveMessage(message)) => {
                if message.conversation_id != self.conversation_id {
                    tracing::debug!(conversation = %message.conversation_id, "Ignoring message for another conversation");
                    return Vec::new();
                }
                metrics::record_message_received();
                self.stream.append(message);
                Vec::new()
            }
            TransportEvent::Server(ServerEvent::NewConversation(_)) => Vec::new(),
            TransportEvent::Server(ServerEvent::ConversationError(descriptor)) => {
                metrics::record_gateway_error("conversation_error");
                tracing::warn!(error = %describe_error(&descriptor), "Conversation error from gateway");
                Vec::new()
            }
            TransportEvent::Server(ServerEvent::MessageError(descriptor)) => {
                metrics::record_gateway_error("message_error");
                tracing::warn!(error = %describe_error(&descriptor), "Message error from gateway");
                Vec::new()
            }
        }
    }

    /// Reload history once it has been requested; earlier phases fetch it anyway
    fn resync(&mut self) -> Vec<SessionEffect> {
        if !matches!(self.phase, SessionPhase::LoadingHistory | SessionPhase::Live) {
            return Vec::new();
        }
        self.generation += 1;
        tracing::info!(conversation = %self.conversation_id, generation = self.generation, "Resyncing support chat");
        vec![SessionEffect::FetchHistory {
            conversation_id: self.conversation_id.clone(),
            generation: self.generation,
        }]
    }

    fn fetch_history(&mut self) -> Vec<SessionEffect> {
        self.phase = SessionPhase::LoadingHistory;
        vec![SessionEffect::FetchHistory {
            conversation_id: self.conversation_id.clone(),
            generation: self.generation,
        }]
    }

    fn go_live(&mut self) -> Vec<SessionEffect> {
        self.phase = SessionPhase::Live;
        vec![SessionEffect::Emit(ClientEvent::JoinConversation(
            self.conversation_id.clone(),
        ))]
    }

    pub fn send(&mut self, text: &str) -> Vec<SessionEffect> {
        if self.phase == SessionPhase::Closed {
            return Vec::new();
        }
        match OutgoingMessage::compose(Some(&self.conversation_id), &self.user_id, text, self.connected) {
            Some(message) => {
                metrics::record_message_sent();
                vec![SessionEffect::Emit(ClientEvent::SendMessage(message))]
            }
            None => {
                metrics::record_send_rejected();
                Vec::new()
            }
        }
    }

    /// Drop local state and the connection; the conversation stays on the server
    fn close(&mut self) -> Vec<SessionEffect> {
        self.stream.clear();
        self.draft.clear();
        self.connected = false;
        self.generation += 1;
        self.phase = SessionPhase::Closed;
        tracing::info!(conversation = %self.conversation_id, "Support chat closed");
        vec![SessionEffect::Disconnect]
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn messages(&self) -> &[Message] {
        self.stream.messages()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            order_id: self.order_id.clone(),
            conversation_id: self.conversation_id.clone(),
            phase: self.phase,
            connected: self.connected,
            messages: self.stream.messages().to_vec(),
            draft: self.draft.clone(),
        }
    }
}
