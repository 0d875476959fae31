// ABOUTME: Wire events exchanged with the realtime gateway and their payload codec.
// ABOUTME: Payloads are socket.io argument arrays: ["<name>"] or ["<name>", <data>].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{Conversation, Message};

/// Payload of a `send_message` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub conversation_id: String,
    pub sender_id: String,
    pub text: String,
    /// Always serialized, `null` when absent
    pub attachment_url: Option<String>,
}

impl OutgoingMessage {
    /// Build a send payload, or `None` when the send must be a no-op.
    ///
    /// Empty or whitespace-only text, a dropped connection and a missing
    /// conversation all reject the send.
    pub fn compose(
        conversation_id: Option<&str>,
        sender_id: &str,
        text: &str,
        connected: bool,
    ) -> Option<Self> {
        if text.trim().is_empty() || !connected {
            return None;
        }
        let conversation_id = conversation_id?;
        Some(Self {
            conversation_id: conversation_id.to_string(),
            sender_id: sender_id.to_string(),
            text: text.to_string(),
            attachment_url: None,
        })
    }
}

/// Events the client emits to the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Announce the admin role so the gateway routes broadcasts to us
    AdminJoin,
    /// Scope future pushes to a conversation
    JoinConversation(String),
    SendMessage(OutgoingMessage),
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AdminJoin => "admin_join",
            Self::JoinConversation(_) => "join_conversation",
            Self::SendMessage(_) => "send_message",
        }
    }
}

/// Events the gateway pushes to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    ReceiveMessage(Message),
    NewConversation(Conversation),
    ConversationError(Value),
    MessageError(Value),
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReceiveMessage(_) => "receive_message",
            Self::NewConversation(_) => "new_conversation",
            Self::ConversationError(_) => "conversation_error",
            Self::MessageError(_) => "message_error",
        }
    }
}

/// What a connection reports to the components consuming it
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected,
    Disconnected { reason: String },
    Server(ServerEvent),
}

/// Encode an outbound event as its argument array
pub fn encode_frame(event: &ClientEvent) -> Result<String> {
    let tagged = serde_json::to_value(event)
        .with_context(|| format!("Failed to encode {} event", event.name()))?;
    let mut args = vec![Value::String(event.name().to_string())];
    if let Some(data) = tagged.get("data") {
        args.push(data.clone());
    }
    Ok(Value::Array(args).to_string())
}

/// Decode an inbound argument array; extra arguments are ignored
pub fn decode_frame(text: &str) -> Result<ServerEvent> {
    let args: Vec<Value> =
        serde_json::from_str(text).context("Event payload is not a JSON array")?;
    let mut args = args.into_iter();
    let name = match args.next() {
        Some(Value::String(name)) => name,
        _ => anyhow::bail!("Event payload has no event name"),
    };
    let data = args.next().unwrap_or(Value::Null);
    serde_json::from_value(serde_json::json!({ "event": name, "data": data }))
        .with_context(|| format!("Unsupported gateway event: {}", name))
}

/// Human-readable summary of an error descriptor pushed by the gateway
pub fn describe_error(descriptor: &Value) -> String {
    match descriptor {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("message")
            .or_else(|| map.get("error"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| descriptor.to_string()),
        other => other.to_string(),
    }
}
