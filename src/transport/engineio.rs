// ABOUTME: Engine.IO v4 and Socket.IO v5 packet framing shared by both gateway transports
// ABOUTME: Decodes text packets, encodes the few the client sends, builds /socket.io/ URLs

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::join_segments;

/// Engine.IO protocol revision spoken by socket.io v4 servers
pub const PROTOCOL: &str = "4";

/// Separates packets inside one long-poll payload
pub const RECORD_SEPARATOR: char = '\u{1e}';

/// Body of the Engine.IO open packet
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    pub ping_interval: u64,
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: Option<u64>,
}

impl Handshake {
    /// The server pings every interval; silence past interval + timeout means it is gone
    pub fn liveness_window(&self) -> Duration {
        Duration::from_millis(self.ping_interval + self.ping_timeout)
    }
}

/// One decoded text packet, flattened across the Engine.IO and Socket.IO layers
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Open(Handshake),
    Close,
    Ping,
    Pong,
    Noop,
    /// Namespace connect accepted
    Connect,
    /// Namespace connect refused, with the server's reason
    ConnectError(Value),
    /// Server left the namespace
    Disconnect,
    /// Event argument array, still JSON text
    Event(String),
    /// Acks, binary packets and transport upgrade checks; the client has no use for them
    Ignored,
}

pub fn decode_packet(text: &str) -> Result<Packet> {
    let mut chars = text.chars();
    let kind = chars.next().context("Empty packet")?;
    let body = chars.as_str();
    Ok(match kind {
        '0' => Packet::Open(serde_json::from_str(body).context("Invalid open packet")?),
        '1' => Packet::Close,
        '2' => Packet::Ping,
        '3' => Packet::Pong,
        '4' => decode_socket_packet(body)?,
        '5' => Packet::Ignored,
        '6' => Packet::Noop,
        other => anyhow::bail!("Unknown packet type: {}", other),
    })
}

fn decode_socket_packet(body: &str) -> Result<Packet> {
    let mut chars = body.chars();
    let kind = chars.next().context("Empty message packet")?;
    let rest = chars.as_str();
    if rest.starts_with('/') {
        // Only the default namespace is used
        return Ok(Packet::Ignored);
    }
    Ok(match kind {
        '0' => Packet::Connect,
        '1' => Packet::Disconnect,
        // An ack id may precede the array
        '2' => Packet::Event(rest.trim_start_matches(|c: char| c.is_ascii_digit()).to_string()),
        '4' => Packet::ConnectError(serde_json::from_str(rest).unwrap_or(Value::Null)),
        '3' | '5' | '6' => Packet::Ignored,
        other => anyhow::bail!("Unknown socket.io packet type: {}", other),
    })
}

/// Packets the client sends
pub fn connect_packet() -> &'static str {
    "40"
}

pub fn disconnect_packet() -> &'static str {
    "41"
}

pub fn pong_packet() -> &'static str {
    "3"
}

pub fn event_packet(args: &str) -> String {
    format!("42{}", args)
}

/// Packets of a long-poll response body
pub fn split_payload(body: &str) -> impl Iterator<Item = &str> {
    body.split(RECORD_SEPARATOR).filter(|p| !p.is_empty())
}

/// `<base>/socket.io/?EIO=4&transport=<transport>[&sid=<sid>]`
pub fn endpoint(base: &Url, transport: &str, sid: Option<&str>) -> Result<Url> {
    let mut url = join_segments(base, &["socket.io", ""])?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("EIO", PROTOCOL);
        query.append_pair("transport", transport);
        if let Some(sid) = sid {
            query.append_pair("sid", sid);
        }
    }
    Ok(url)
}
