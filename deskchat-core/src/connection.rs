// ABOUTME: Connection manager for the realtime gateway: connect, bounded reconnect, teardown.
// ABOUTME: Publishes connection state on a watch channel and inbound events on a broadcast hub.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::backoff::{ReconnectPolicy, ReconnectState};
use crate::events::{ClientEvent, TransportEvent};
use crate::metrics;
use crate::traits::{Connector, Link};

/// Transport state as seen by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Connection tuning shared by the admin and customer surfaces
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Handshake timeout per transport attempt
    pub timeout: Duration,
    /// Whether dropped or failed links are retried at all
    pub reconnection: bool,
    pub policy: ReconnectPolicy,
    /// Event emitted first on every established link (role announcement)
    pub announce: Option<ClientEvent>,
    /// Outbound events buffered while the link is down
    pub outbound_capacity: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            reconnection: true,
            policy: ReconnectPolicy::default(),
            announce: None,
            outbound_capacity: 64,
        }
    }
}

impl ConnectionConfig {
    /// Admin surface: announces `admin_join` on every connect
    pub fn admin() -> Self {
        Self {
            announce: Some(ClientEvent::AdminJoin),
            ..Self::default()
        }
    }

    /// Customer widget: no role announcement
    pub fn customer() -> Self {
        Self::default()
    }
}

/// Cheap, cloneable view of one running connection instance
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: Uuid,
    outbound: mpsc::Sender<ClientEvent>,
    state: watch::Receiver<ConnectionState>,
}

impl ConnectionHandle {
    /// Identity of the underlying connection instance
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Queue an event for the gateway. Failures are logged, never returned.
    pub fn emit(&self, event: ClientEvent) -> bool {
        let name = event.name();
        match self.outbound.try_send(event) {
            Ok(()) => {
                tracing::debug!(event = name, connection = %self.id, "Queued gateway event");
                true
            }
            Err(e) => {
                tracing::warn!(event = name, connection = %self.id, error = %e, "Dropped gateway event");
                false
            }
        }
    }
}

struct Running {
    handle: ConnectionHandle,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Owns at most one physical connection to the gateway.
///
/// Constructed explicitly and injected into whatever needs it; the admin
/// session shares one manager across its surfaces, each customer widget owns
/// its own.
pub struct ConnectionManager {
    connectors: Vec<Arc<dyn Connector>>,
    config: ConnectionConfig,
    events: broadcast::Sender<TransportEvent>,
    state: Arc<watch::Sender<ConnectionState>>,
    running: Mutex<Option<Running>>,
}

impl ConnectionManager {
    /// `connectors` are tried in preference order on every attempt
    pub fn new(connectors: Vec<Arc<dyn Connector>>, config: ConnectionConfig) -> Self {
        let (events, _) = broadcast::channel(256);
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            connectors,
            config,
            events,
            state: Arc::new(state),
            running: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Establish the connection, or return the live one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(&self) -> ConnectionHandle {
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(current) = running.as_ref() {
            if !current.task.is_finished() {
                return current.handle.clone();
            }
            tracing::debug!(connection = %current.handle.id, "Previous connection gave up, starting a new one");
        }

        let id = Uuid::new_v4();
        let (outbound, outbound_rx) = mpsc::channel(self.config.outbound_capacity.max(1));
        let cancel = CancellationToken::new();
        let handle = ConnectionHandle {
            id,
            outbound,
            state: self.state.subscribe(),
        };

        let supervisor = Supervisor {
            id,
            connectors: self.connectors.clone(),
            config: self.config.clone(),
            events: self.events.clone(),
            state: Arc::clone(&self.state),
            cancel: cancel.clone(),
        };
        tracing::info!(connection = %id, "Connecting to realtime gateway");
        let task = tokio::spawn(supervisor.run(outbound_rx));

        *running = Some(Running {
            handle: handle.clone(),
            cancel,
            task,
        });
        handle
    }

    /// Tear down the connection and forget the instance
    pub fn disconnect(&self) {
        let taken = self
            .running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        let Some(running) = taken else {
            return;
        };
        running.cancel.cancel();
        tracing::info!(connection = %running.handle.id, "Disconnected from realtime gateway");

        let previous = self.state.send_replace(ConnectionState::Disconnected);
        if previous.is_connected() {
            let _ = self.events.send(TransportEvent::Disconnected {
                reason: "client disconnect".to_string(),
            });
        }
    }

    /// The live connection instance, if any
    pub fn current(&self) -> Option<ConnectionHandle> {
        self.running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|r| r.handle.clone())
    }

    /// Emit through the live connection; dropped with a warning when there is none
    pub fn emit(&self, event: ClientEvent) -> bool {
        match self.current() {
            Some(handle) => handle.emit(event),
            None => {
                tracing::warn!(event = event.name(), "No connection, dropping gateway event");
                false
            }
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Receive connect/disconnect transitions and pushed events
    pub fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.events.subscribe()
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(running) = self
            .running
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            running.cancel.cancel();
        }
    }
}

// =============================================================================
// Supervisor task
// =============================================================================

enum PumpExit {
    Cancelled,
    Released,
    Dropped(String),
}

struct Supervisor {
    id: Uuid,
    connectors: Vec<Arc<dyn Connector>>,
    config: ConnectionConfig,
    events: broadcast::Sender<TransportEvent>,
    state: Arc<watch::Sender<ConnectionState>>,
    cancel: CancellationToken,
}

impl Supervisor {
    async fn run(self, mut outbound_rx: mpsc::Receiver<ClientEvent>) {
        let mut retry = ReconnectState::new(self.config.policy.clone());

        loop {
            self.set_state(ConnectionState::Connecting);
            let opened = tokio::select! {
                _ = self.cancel.cancelled() => return,
                link = self.open_link() => link,
            };

            if let Some(link) = opened {
                retry.record_success();
                self.set_state(ConnectionState::Connected);
                self.publish(TransportEvent::Connected);

                let reason = match self.pump(link, &mut outbound_rx).await {
                    PumpExit::Cancelled => return,
                    PumpExit::Released => {
                        self.set_state(ConnectionState::Disconnected);
                        return;
                    }
                    PumpExit::Dropped(reason) => reason,
                };
                tracing::warn!(connection = %self.id, %reason, "Gateway link dropped");
                self.set_state(ConnectionState::Disconnected);
                self.publish(TransportEvent::Disconnected { reason });
            } else {
                self.set_state(ConnectionState::Disconnected);
            }

            if !self.config.reconnection {
                tracing::info!(connection = %self.id, "Reconnection disabled, staying offline");
                return;
            }

            match retry.next_attempt() {
                Some(delay) => {
                    metrics::record_reconnect_attempt();
                    tracing::info!(
                        connection = %self.id,
                        attempt = retry.attempts(),
                        delay_ms = delay.as_millis() as u64,
                        "Scheduling reconnect"
                    );
                    tokio::select! {
                        _ = self.cancel.cancelled() => return,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                None => {
                    tracing::warn!(
                        connection = %self.id,
                        attempts = retry.attempts(),
                        "Giving up on realtime gateway"
                    );
                    return;
                }
            }
        }
    }

    /// Try each transport in preference order; first successful handshake wins
    async fn open_link(&self) -> Option<Link> {
        for connector in &self.connectors {
            let transport = connector.transport_name();
            match tokio::time::timeout(self.config.timeout, connector.open()).await {
                Ok(Ok(link)) => {
                    tracing::info!(connection = %self.id, transport, "Gateway link established");
                    return Some(link);
                }
                Ok(Err(e)) => {
                    tracing::warn!(connection = %self.id, transport, error = %e, "Gateway handshake failed");
                }
                Err(_) => {
                    tracing::warn!(
                        connection = %self.id,
                        transport,
                        timeout_secs = self.config.timeout.as_secs(),
                        "Gateway handshake timed out"
                    );
                }
            }
        }
        None
    }

    async fn pump(&self, link: Link, outbound_rx: &mut mpsc::Receiver<ClientEvent>) -> PumpExit {
        let Link {
            outbound,
            mut inbound,
        } = link;

        if let Some(announce) = &self.config.announce {
            if outbound.send(announce.clone()).await.is_err() {
                return PumpExit::Dropped("link closed during role announcement".to_string());
            }
        }

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return PumpExit::Cancelled,
                event = inbound.recv() => match event {
                    Some(event) => {
                        tracing::trace!(connection = %self.id, event = event.name(), "Gateway event");
                        self.publish(TransportEvent::Server(event));
                    }
                    None => return PumpExit::Dropped("transport closed".to_string()),
                },
                event = outbound_rx.recv() => match event {
                    Some(event) => {
                        if outbound.send(event).await.is_err() {
                            return PumpExit::Dropped("transport closed while sending".to_string());
                        }
                    }
                    None => return PumpExit::Released,
                },
            }
        }
    }

    fn set_state(&self, state: ConnectionState) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.state.send_replace(state);
    }

    fn publish(&self, event: TransportEvent) {
        if self.cancel.is_cancelled() {
            return;
        }
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
