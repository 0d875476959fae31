// ABOUTME: socket.io HTTP long-polling transport, the fallback when websockets are unavailable
// ABOUTME: Engine.IO handshake over GET/POST, then one poll outstanding and one POST per emit

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use deskchat_core::events::{decode_frame, describe_error, encode_frame, ClientEvent, ServerEvent};
use deskchat_core::metrics;
use deskchat_core::traits::{Connector, Link};
use reqwest::header;
use tokio::sync::mpsc;
use url::Url;

use super::engineio::{self, Packet};
use super::LINK_CAPACITY;

#[derive(Clone)]
pub struct LongPollConnector {
    base_url: Url,
    client: reqwest::Client,
    cookie: Option<String>,
}

/// What to do after handling one packet
enum Flow {
    Continue,
    Stop,
}

impl LongPollConnector {
    pub fn new(gateway_url: &str, cookie: Option<String>) -> Result<Self> {
        let base_url = Url::parse(gateway_url).context("Invalid gateway URL")?;
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url,
            client,
            cookie,
        })
    }

    fn endpoint(&self, sid: Option<&str>) -> Result<Url> {
        engineio::endpoint(&self.base_url, "polling", sid)
    }

    fn with_cookie(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.cookie {
            Some(cookie) => request.header(header::COOKIE, cookie),
            None => request,
        }
    }

    async fn get(&self, url: &Url) -> Result<String> {
        let response = self
            .with_cookie(self.client.get(url.clone()))
            .send()
            .await
            .context("Poll request failed")?;
        if !response.status().is_success() {
            anyhow::bail!("Gateway rejected poll: {}", response.status());
        }
        response.text().await.context("Failed to read poll payload")
    }

    async fn post(&self, url: &Url, body: impl Into<String>) -> Result<()> {
        let body: String = body.into();
        let response = self
            .with_cookie(self.client.post(url.clone()))
            .header(header::CONTENT_TYPE, "text/plain;charset=UTF-8")
            .body(body)
            .send()
            .await
            .context("Emit request failed")?;
        if !response.status().is_success() {
            anyhow::bail!("Gateway rejected emit: {}", response.status());
        }
        Ok(())
    }
}

#[async_trait]
impl Connector for LongPollConnector {
    fn transport_name(&self) -> &str {
        "polling"
    }

    async fn open(&self) -> Result<Link> {
        let body = self
            .get(&self.endpoint(None)?)
            .await
            .context("Failed to open long-poll session")?;
        let opened = match engineio::split_payload(&body).next().map(engineio::decode_packet) {
            Some(Ok(Packet::Open(handshake))) => handshake,
            Some(Err(e)) => return Err(e).context("Invalid long-poll handshake"),
            _ => anyhow::bail!("Gateway did not open a long-poll session"),
        };
        tracing::debug!(sid = %opened.sid, "Engine.IO session opened");
        let url = self.endpoint(Some(&opened.sid))?;

        self.post(&url, engineio::connect_packet()).await?;
        let pending = self.await_connect(&url).await?;

        let (link, from_client, to_client) = Link::pair(LINK_CAPACITY);
        tokio::spawn(
            self.clone()
                .poll_loop(url.clone(), pending, to_client, opened.liveness_window()),
        );
        tokio::spawn(self.clone().emit_loop(url, from_client));
        Ok(link)
    }
}

impl LongPollConnector {
    /// Poll until the namespace connect is acknowledged; returns packets that followed it
    async fn await_connect(&self, url: &Url) -> Result<Vec<String>> {
        loop {
            let body = self.get(url).await?;
            let mut packets = engineio::split_payload(&body);
            while let Some(raw) = packets.next() {
                match engineio::decode_packet(raw)? {
                    Packet::Connect => return Ok(packets.map(str::to_string).collect()),
                    Packet::ConnectError(reason) => {
                        anyhow::bail!("Gateway refused the connection: {}", describe_error(&reason))
                    }
                    Packet::Ping => self.post(url, engineio::pong_packet()).await?,
                    Packet::Close | Packet::Disconnect => {
                        anyhow::bail!("Gateway closed the session during handshake")
                    }
                    _ => {}
                }
            }
        }
    }

    /// Keep one poll outstanding; a failed or silent poll ends the link
    async fn poll_loop(
        self,
        url: Url,
        pending: Vec<String>,
        to_client: mpsc::Sender<ServerEvent>,
        window: Duration,
    ) {
        for raw in &pending {
            if let Flow::Stop = self.handle_packet(&url, raw, &to_client).await {
                return;
            }
        }

        loop {
            let polled = tokio::select! {
                _ = to_client.closed() => return,
                polled = tokio::time::timeout(window, self.get(&url)) => polled,
            };
            let body = match polled {
                Ok(Ok(body)) => body,
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "Long-poll failed");
                    return;
                }
                Err(_) => {
                    tracing::warn!(window_ms = window.as_millis() as u64, "Gateway stopped answering polls");
                    return;
                }
            };

            for raw in engineio::split_payload(&body) {
                if let Flow::Stop = self.handle_packet(&url, raw, &to_client).await {
                    return;
                }
            }
        }
    }

    async fn handle_packet(&self, url: &Url, raw: &str, to_client: &mpsc::Sender<ServerEvent>) -> Flow {
        match engineio::decode_packet(raw) {
            Ok(Packet::Ping) => {
                if let Err(e) = self.post(url, engineio::pong_packet()).await {
                    tracing::warn!(error = %e, "Failed to answer gateway ping");
                    return Flow::Stop;
                }
            }
            Ok(Packet::Event(args)) => match decode_frame(&args) {
                Ok(event) => {
                    if to_client.send(event).await.is_err() {
                        return Flow::Stop;
                    }
                }
                Err(e) => {
                    metrics::record_gateway_error("invalid_frame");
                    tracing::warn!(error = %e, "Ignoring undecodable gateway event");
                }
            },
            Ok(Packet::Close) | Ok(Packet::Disconnect) => {
                tracing::info!("Gateway ended the socket.io session");
                return Flow::Stop;
            }
            Ok(Packet::ConnectError(reason)) => {
                tracing::warn!(error = %describe_error(&reason), "Gateway dropped the namespace");
                return Flow::Stop;
            }
            Ok(_) => {}
            Err(e) => {
                metrics::record_gateway_error("invalid_frame");
                tracing::warn!(error = %e, "Ignoring undecodable gateway packet");
            }
        }
        Flow::Continue
    }

    /// Post each client event; a failed emit ends the link
    async fn emit_loop(self, url: Url, mut from_client: mpsc::Receiver<ClientEvent>) {
        while let Some(event) = from_client.recv().await {
            let args = match encode_frame(&event) {
                Ok(args) => args,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode gateway event");
                    continue;
                }
            };
            if let Err(e) = self.post(&url, engineio::event_packet(&args)).await {
                tracing::warn!(error = %e, event = event.name(), "Emit failed");
                return;
            }
        }
        // Link released on our side
        let _ = self.post(&url, engineio::disconnect_packet()).await;
    }
}
