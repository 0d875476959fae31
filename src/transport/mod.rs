// ABOUTME: socket.io gateway transports (websocket and HTTP long-poll) behind the Connector trait
// ABOUTME: Builds the connector list in the configured preference order

pub mod engineio;
pub mod poll;
pub mod ws;

use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use deskchat_core::traits::Connector;
use url::Url;

use crate::config::GatewayConfig;

pub use poll::LongPollConnector;
pub use ws::WebSocketConnector;

/// Frames buffered per direction inside a transport
const LINK_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Websocket,
    Polling,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Websocket => "websocket",
            Self::Polling => "polling",
        }
    }
}

impl FromStr for TransportKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "websocket" | "ws" => Ok(Self::Websocket),
            "polling" | "long-poll" | "longpoll" => Ok(Self::Polling),
            other => anyhow::bail!("Unknown transport: {}", other),
        }
    }
}

/// Append path segments to a base URL, keeping any path prefix it has
pub(crate) fn join_segments(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("URL cannot be a base: {}", base))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// One connector per configured transport, in preference order
pub fn build_connectors(config: &GatewayConfig) -> Result<Vec<Arc<dyn Connector>>> {
    let cookie = config.credentials().map(str::to_string);
    config
        .transport_kinds()?
        .into_iter()
        .map(|kind| -> Result<Arc<dyn Connector>> {
            Ok(match kind {
                TransportKind::Websocket => {
                    Arc::new(WebSocketConnector::new(&config.url, cookie.clone())?)
                }
                TransportKind::Polling => {
                    Arc::new(LongPollConnector::new(&config.url, cookie.clone())?)
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_names() {
        assert_eq!("websocket".parse::<TransportKind>().unwrap(), TransportKind::Websocket);
        assert_eq!("Polling".parse::<TransportKind>().unwrap(), TransportKind::Polling);
        assert!("smoke-signals".parse::<TransportKind>().is_err());
    }

    #[test]
    fn test_connectors_follow_preference_order() {
        let config = GatewayConfig {
            transports: vec!["polling".to_string(), "websocket".to_string()],
            ..GatewayConfig::default()
        };
        let connectors = build_connectors(&config).unwrap();
        let names: Vec<_> = connectors.iter().map(|c| c.transport_name()).collect();
        assert_eq!(names, vec!["polling", "websocket"]);
    }
}
