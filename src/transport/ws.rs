// ABOUTME: socket.io websocket transport to the realtime gateway using tokio-tungstenite
// ABOUTME: Engine.IO open, namespace connect, then one task pumping events, pings and sends

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use deskchat_core::events::{decode_frame, describe_error, encode_frame, ClientEvent, ServerEvent};
use deskchat_core::metrics;
use deskchat_core::traits::{Connector, Link};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use super::engineio::{self, Packet};
use super::LINK_CAPACITY;

type WebSocketStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;
type WsSink = SplitSink<WebSocketStream, Message>;
type WsSource = SplitStream<WebSocketStream>;

pub struct WebSocketConnector {
    url: Url,
    cookie: Option<String>,
}

impl WebSocketConnector {
    /// `gateway_url` is the http(s) base the socket.io server is mounted on
    pub fn new(gateway_url: &str, cookie: Option<String>) -> Result<Self> {
        let base = Url::parse(gateway_url).context("Invalid gateway URL")?;
        let mut url = engineio::endpoint(&base, "websocket", None)?;
        let scheme = match base.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme)
            .map_err(|_| anyhow::anyhow!("Cannot derive websocket URL from {}", gateway_url))?;
        Ok(Self { url, cookie })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    fn transport_name(&self) -> &str {
        "websocket"
    }

    async fn open(&self) -> Result<Link> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .context("Invalid websocket request")?;
        if let Some(cookie) = &self.cookie {
            let value = HeaderValue::from_str(cookie).context("Session cookie is not a valid header")?;
            request.headers_mut().insert("Cookie", value);
        }

        tracing::debug!(url = %self.url, "Opening websocket");
        let (ws_stream, _) = connect_async(request)
            .await
            .context("Failed to connect to realtime gateway")?;
        let (mut sink, mut stream) = ws_stream.split();

        let window = handshake(&mut sink, &mut stream).await?;

        let (link, from_client, to_client) = Link::pair(LINK_CAPACITY);
        tokio::spawn(pump(sink, stream, from_client, to_client, window));
        Ok(link)
    }
}

async fn send_text(sink: &mut WsSink, text: impl Into<String>) -> Result<()> {
    let text: String = text.into();
    sink.send(Message::Text(text.into()))
        .await
        .context("Websocket send failed")
}

/// Next text packet, skipping websocket-level control frames
async fn next_packet(stream: &mut WsSource) -> Result<Packet> {
    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => return engineio::decode_packet(text.as_str()),
            Some(Ok(Message::Close(_))) | None => {
                anyhow::bail!("Gateway closed the websocket during handshake")
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(e).context("Websocket error during handshake"),
        }
    }
}

/// Engine.IO open then namespace connect; returns the ping liveness window
async fn handshake(sink: &mut WsSink, stream: &mut WsSource) -> Result<Duration> {
    let opened = match next_packet(stream).await? {
        Packet::Open(handshake) => handshake,
        other => anyhow::bail!("Expected Engine.IO open packet, got {:?}", other),
    };
    tracing::debug!(sid = %opened.sid, "Engine.IO session opened");

    send_text(sink, engineio::connect_packet()).await?;
    loop {
        match next_packet(stream).await? {
            Packet::Connect => break,
            Packet::ConnectError(reason) => {
                anyhow::bail!("Gateway refused the connection: {}", describe_error(&reason))
            }
            Packet::Ping => send_text(sink, engineio::pong_packet()).await?,
            Packet::Close | Packet::Disconnect => {
                anyhow::bail!("Gateway closed the session during handshake")
            }
            _ => {}
        }
    }
    Ok(opened.liveness_window())
}

/// Relay until either side goes away; leaving from our side says goodbye
async fn pump(
    mut sink: WsSink,
    mut stream: WsSource,
    mut from_client: mpsc::Receiver<ClientEvent>,
    to_client: mpsc::Sender<ServerEvent>,
    window: Duration,
) {
    let mut deadline = Instant::now() + window;
    loop {
        tokio::select! {
            _ = to_client.closed() => break,
            _ = tokio::time::sleep_until(deadline) => {
                tracing::warn!(window_ms = window.as_millis() as u64, "Gateway stopped pinging");
                return;
            }
            event = from_client.recv() => {
                let Some(event) = event else { break };
                let args = match encode_frame(&event) {
                    Ok(args) => args,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to encode gateway event");
                        continue;
                    }
                };
                if let Err(e) = send_text(&mut sink, engineio::event_packet(&args)).await {
                    tracing::warn!(error = %e, event = event.name(), "Websocket send failed");
                    return;
                }
            }
            msg = stream.next() => {
                let text = match msg {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!("Gateway closed the websocket");
                        return;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Websocket error");
                        return;
                    }
                };
                deadline = Instant::now() + window;

                match engineio::decode_packet(text.as_str()) {
                    Ok(Packet::Ping) => {
                        if send_text(&mut sink, engineio::pong_packet()).await.is_err() {
                            return;
                        }
                    }
                    Ok(Packet::Event(args)) => match decode_frame(&args) {
                        Ok(event) => {
                            if to_client.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            metrics::record_gateway_error("invalid_frame");
                            tracing::warn!(error = %e, "Ignoring undecodable gateway event");
                        }
                    },
                    Ok(Packet::Close) | Ok(Packet::Disconnect) => {
                        tracing::info!("Gateway ended the socket.io session");
                        return;
                    }
                    Ok(Packet::ConnectError(reason)) => {
                        tracing::warn!(error = %describe_error(&reason), "Gateway dropped the namespace");
                        return;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        metrics::record_gateway_error("invalid_frame");
                        tracing::warn!(error = %e, "Ignoring undecodable gateway packet");
                    }
                }
            }
        }
    }

    let _ = send_text(&mut sink, engineio::disconnect_packet()).await;
    let _ = sink.send(Message::Close(None)).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_url_from_http_base() {
        let connector = WebSocketConnector::new("http://localhost:5000", None).unwrap();
        assert_eq!(
            connector.url().as_str(),
            "ws://localhost:5000/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn test_socket_url_from_https_base_with_prefix() {
        let connector = WebSocketConnector::new("https://shop.example.com/support", None).unwrap();
        assert_eq!(
            connector.url().as_str(),
            "wss://shop.example.com/support/socket.io/?EIO=4&transport=websocket"
        );
    }
}
