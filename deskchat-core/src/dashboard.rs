// ABOUTME: Admin chat dashboard state machine: selection, event routing, send guard.
// ABOUTME: One dispatcher (`handle`) consumes typed events and returns effects for the driver.

use crate::directory::ConversationDirectory;
use crate::events::{describe_error, ClientEvent, OutgoingMessage, ServerEvent, TransportEvent};
use crate::metrics;
use crate::model::{Conversation, Message};
use crate::stream::MessageStream;

/// Default identity the admin role sends messages as
pub const DEFAULT_ADMIN_ID: &str = "admin";

/// Per-operator dashboard settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardOptions {
    /// Sender id used for admin messages; messages from it never count as unread
    pub admin_id: String,
    /// Open a pushed conversation automatically when nothing is selected
    pub auto_select_new: bool,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            admin_id: DEFAULT_ADMIN_ID.to_string(),
            auto_select_new: true,
        }
    }
}

/// What the thread pane is showing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    NoConversationSelected,
    LoadingHistory { conversation_id: String },
    Live { conversation_id: String },
}

impl ViewState {
    pub fn selected(&self) -> Option<&str> {
        match self {
            Self::NoConversationSelected => None,
            Self::LoadingHistory { conversation_id } | Self::Live { conversation_id } => {
                Some(conversation_id)
            }
        }
    }
}

/// Everything that can happen to the dashboard
#[derive(Debug, Clone)]
pub enum DashboardEvent {
    Transport(TransportEvent),
    /// Operator opened a conversation
    Select(String),
    /// Operator typed into the input
    Draft(String),
    /// Operator pressed send on the current draft
    Submit,
    /// Send this text directly, bypassing the draft
    Send(String),
    /// Pushed events were missed; reload the list and the open thread
    Resync,
    ConversationsLoaded(Vec<Conversation>),
    ConversationsFailed(String),
    HistoryLoaded {
        conversation_id: String,
        generation: u64,
        messages: Vec<Message>,
    },
    HistoryFailed {
        conversation_id: String,
        generation: u64,
        error: String,
    },
}

/// Work the driver performs on the dashboard's behalf
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Emit(ClientEvent),
    FetchConversations,
    FetchHistory { conversation_id: String, generation: u64 },
}

/// Render-ready copy of the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub connected: bool,
    pub view: ViewState,
    pub conversations: Vec<Conversation>,
    pub messages: Vec<Message>,
    pub draft: String,
    pub total_unread: u32,
}

/// Admin dashboard state. Owns the directory and the selected stream.
#[derive(Debug, Clone)]
pub struct AdminDashboard {
    options: DashboardOptions,
    directory: ConversationDirectory,
    stream: Option<MessageStream>,
    view: ViewState,
    connected: bool,
    /// Bumped on every selection change; tags history fetches
    generation: u64,
    draft: String,
}

impl AdminDashboard {
    pub fn new(options: DashboardOptions) -> Self {
        Self {
            options,
            directory: ConversationDirectory::new(),
            stream: None,
            view: ViewState::NoConversationSelected,
            connected: false,
            generation: 0,
            draft: String::new(),
        }
    }

    /// Single entry point for every event
    pub fn handle(&mut self, event: DashboardEvent) -> Vec<Effect> {
        match event {
            DashboardEvent::Transport(event) => self.on_transport(event),
            DashboardEvent::Select(conversation_id) => self.select(&conversation_id),
            DashboardEvent::Draft(text) => {
                self.draft = text;
                Vec::new()
            }
            DashboardEvent::Submit => self.submit_draft(),
            DashboardEvent::Send(text) => self.send(&text),
            DashboardEvent::Resync => self.resync(),
            DashboardEvent::ConversationsLoaded(conversations) => {
                tracing::debug!(count = conversations.len(), "Conversation list loaded");
                self.directory.replace_all(conversations);
                if let Some(selected) = self.view.selected().map(str::to_string) {
                    self.directory.mark_read(&selected);
                }
                Vec::new()
            }
            DashboardEvent::ConversationsFailed(error) => {
                metrics::record_bootstrap_failure("conversations");
                tracing::warn!(%error, "Failed to load conversations");
                Vec::new()
            }
            DashboardEvent::HistoryLoaded {
                conversation_id,
                generation,
                messages,
            } => {
                if self.is_stale(&conversation_id, generation) {
                    tracing::debug!(conversation = %conversation_id, generation, "Discarding stale history");
                    return Vec::new();
                }
                if let Some(stream) = self.stream.as_mut() {
                    stream.bootstrap(messages);
                }
                self.view = ViewState::Live { conversation_id };
                Vec::new()
            }
            DashboardEvent::HistoryFailed {
                conversation_id,
                generation,
                error,
            } => {
                if self.is_stale(&conversation_id, generation) {
                    return Vec::new();
                }
                metrics::record_bootstrap_failure("history");
                tracing::warn!(conversation = %conversation_id, %error, "Failed to load history");
                self.view = ViewState::Live { conversation_id };
                Vec::new()
            }
        }
    }

    fn on_transport(&mut self, event: TransportEvent) -> Vec<Effect> {
        match event {
            TransportEvent::Connected => {
                if self.connected {
                    return Vec::new();
                }
                self.connected = true;
                tracing::info!("Admin dashboard connected");
                let mut effects = vec![Effect::FetchConversations];
                if let Some(selected) = self.view.selected() {
                    effects.push(Effect::Emit(ClientEvent::JoinConversation(selected.to_string())));
                }
                effects
            }
            TransportEvent::Disconnected { reason } => {
                if self.connected {
                    tracing::info!(%reason, "Admin dashboard disconnected");
                }
                self.connected = false;
                Vec::new()
            }
            TransportEvent::Server(event) => self.on_server(event),
        }
    }

    fn on_server(&mut self, event: ServerEvent) -> Vec<Effect> {
        match event {
            ServerEvent::ReceiveMessage(message) => {
                metrics::record_message_received();
                let selected = self.view.selected().map(str::to_string);
                self.directory
                    .apply_message(&message, selected.as_deref(), &self.options.admin_id);
                if selected.as_deref() == Some(message.conversation_id.as_str()) {
                    if let Some(stream) = self.stream.as_mut() {
                        stream.append(message);
                    }
                }
                Vec::new()
            }
            ServerEvent::NewConversation(conversation) => {
                let id = conversation.id.clone();
                let inserted = self.directory.upsert_from_push(conversation);
                if inserted {
                    tracing::info!(conversation = %id, "New support conversation");
                }
                if inserted && self.options.auto_select_new && self.view.selected().is_none() {
                    return self.select(&id);
                }
                Vec::new()
            }
            ServerEvent::ConversationError(descriptor) => {
                metrics::record_gateway_error("conversation_error");
                tracing::warn!(error = %describe_error(&descriptor), "Conversation error from gateway");
                Vec::new()
            }
            ServerEvent::MessageError(descriptor) => {
                metrics::record_gateway_error("message_error");
                tracing::warn!(error = %describe_error(&descriptor), "Message error from gateway");
                Vec::new()
            }
        }
    }

    /// Open a conversation: zero its unread count, load history, join it.
    ///
    /// Re-selecting the open conversation only clears its unread count.
    pub fn select(&mut self, conversation_id: &str) -> Vec<Effect> {
        self.directory.mark_read(conversation_id);
        if self.view.selected() == Some(conversation_id) {
            return Vec::new();
        }

        self.generation += 1;
        self.stream = Some(MessageStream::new(conversation_id));
        self.view = ViewState::LoadingHistory {
            conversation_id: conversation_id.to_string(),
        };
        tracing::debug!(conversation = %conversation_id, generation = self.generation, "Selected conversation");

        vec![
            Effect::FetchHistory {
                conversation_id: conversation_id.to_string(),
                generation: self.generation,
            },
            Effect::Emit(ClientEvent::JoinConversation(conversation_id.to_string())),
        ]
    }

    /// Refetch the directory and the selected history without leaving the view.
    ///
    /// The fresh history is merged like any bootstrap, so messages already
    /// shown stay put.
    fn resync(&mut self) -> Vec<Effect> {
        let mut effects = vec![Effect::FetchConversations];
        if let Some(selected) = self.view.selected().map(str::to_string) {
            self.generation += 1;
            effects.push(Effect::FetchHistory {
                conversation_id: selected,
                generation: self.generation,
            });
        }
        tracing::info!(generation = self.generation, "Resyncing admin dashboard");
        effects
    }

    /// Emit a message to the selected conversation; no-op when guarded
    pub fn send(&mut self, text: &str) -> Vec<Effect> {
        match OutgoingMessage::compose(
            self.view.selected(),
            &self.options.admin_id,
            text,
            self.connected,
        ) {
            Some(message) => {
                metrics::record_message_sent();
                vec![Effect::Emit(ClientEvent::SendMessage(message))]
            }
            None => {
                metrics::record_send_rejected();
                Vec::new()
            }
        }
    }

    fn submit_draft(&mut self) -> Vec<Effect> {
        let draft = self.draft.clone();
        let effects = self.send(&draft);
        if !effects.is_empty() {
            self.draft.clear();
        }
        effects
    }

    fn is_stale(&self, conversation_id: &str, generation: u64) -> bool {
        generation != self.generation || self.view.selected() != Some(conversation_id)
    }

    pub fn options(&self) -> &DashboardOptions {
        &self.options
    }

    pub fn directory(&self) -> &ConversationDirectory {
        &self.directory
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn selected(&self) -> Option<&str> {
        self.view.selected()
    }

    /// Messages of the selected conversation
    pub fn messages(&self) -> &[Message] {
        self.stream.as_ref().map(|s| s.messages()).unwrap_or(&[])
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            connected: self.connected,
            view: self.view.clone(),
            conversations: self.directory.conversations().to_vec(),
            messages: self.messages().to_vec(),
            draft: self.draft.clone(),
            total_unread: self.directory.total_unread(),
        }
    }
}
