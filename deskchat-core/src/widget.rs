// ABOUTME: Async driver for a customer's order chat; owns its own gateway connection.
// ABOUTME: Closing tears the connection down and clears local messages.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::connection::ConnectionManager;
use crate::events::TransportEvent;
use crate::session::{CustomerSession, SessionEffect, SessionEvent, SessionSnapshot};
use crate::traits::ChatBackend;

/// Handle to an open customer chat
pub struct CustomerChat {
    events: mpsc::Sender<SessionEvent>,
    snapshots: watch::Receiver<SessionSnapshot>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl CustomerChat {
    /// Open the chat for `session`, taking ownership of its connection
    pub fn open(
        connection: ConnectionManager,
        backend: Arc<dyn ChatBackend>,
        session: CustomerSession,
    ) -> Self {
        let (snapshot_tx, snapshots) = watch::channel(session.snapshot());
        let (events, events_rx) = mpsc::channel(128);
        let cancel = CancellationToken::new();

        let transport_rx = connection.subscribe();
        connection.connect();
        tracing::info!(
            order = %session.order_id(),
            conversation = %session.conversation_id(),
            "Opening support chat"
        );

        let driver = Driver {
            session,
            connection,
            backend,
            results: events.clone(),
            snapshots: snapshot_tx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(driver.run(transport_rx, events_rx));

        Self {
            events,
            snapshots,
            cancel,
            task,
        }
    }

    /// Queue an action, waiting for room in the queue.
    /// Returns false if the chat has stopped.
    pub async fn dispatch(&self, event: SessionEvent) -> bool {
        self.events.send(event).await.is_ok()
    }

    pub async fn send(&self, text: impl Into<String>) -> bool {
        self.dispatch(SessionEvent::Send(text.into())).await
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Close the chat and wait for the connection to be torn down
    pub async fn close(mut self) {
        if !self.dispatch(SessionEvent::Close).await {
            self.cancel.cancel();
        }
        if let Err(e) = (&mut self.task).await {
            tracing::warn!(error = %e, "Customer chat task ended abnormally");
        }
    }
}

impl Drop for CustomerChat {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Driver {
    session: CustomerSession,
    connection: ConnectionManager,
    backend: Arc<dyn ChatBackend>,
    results: mpsc::Sender<SessionEvent>,
    snapshots: watch::Sender<SessionSnapshot>,
    cancel: CancellationToken,
}

impl Driver {
    async fn run(
        mut self,
        mut transport_rx: broadcast::Receiver<TransportEvent>,
        mut events_rx: mpsc::Receiver<SessionEvent>,
    ) {
        if self.connection.is_connected() {
            self.dispatch(SessionEvent::Transport(TransportEvent::Connected));
        }

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                event = transport_rx.recv() => match event {
                    Ok(event) => self.dispatch(SessionEvent::Transport(event)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Customer chat lagged behind gateway events");
                        self.dispatch(SessionEvent::Resync);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                event = events_rx.recv() => match event {
                    Some(event) => self.dispatch(event),
                    None => break,
                },
            }
        }

        self.cancel.cancel();
        self.connection.disconnect();
    }

    fn dispatch(&mut self, event: SessionEvent) {
        for effect in self.session.handle(event) {
            self.execute(effect);
        }
        self.snapshots.send_replace(self.session.snapshot());
    }

    fn execute(&self, effect: SessionEffect) {
        match effect {
            SessionEffect::Emit(event) => {
                self.connection.emit(event);
            }
            SessionEffect::EnsureConversation {
                request,
                generation,
            } => {
                let backend = Arc::clone(&self.backend);
                let results = self.results.clone();
                let cancel = self.cancel.clone();
                tokio::spawn(async move {
                    let result = tokio::select! {
                        _ = cancel.cancelled() => return,
                        result = backend.create_conversation(&request) => result,
                    };
                    let event = match result {
                        Ok(conversation) => SessionEvent::ConversationReady {
                            generation,
                            conversation,
                        },
                        Err(e) => SessionEvent::ConversationFailed {
                            generation,
                            error: format!("{:#}", e),
                        },
                    };
                    let _ = results.send(event).await;
                });
            }
            SessionEffect::FetchHistory {
                conversation_id,
                generation,
            } => {
                let backend = Arc::clone(&self.backend);
                let results = self.results.clone();
                let cancel = self.cancel.clone();
                tokio::spawn(async move {
                    let result = tokio::select! {
                        _ = cancel.cancelled() => return,
                        result = backend.list_messages(&conversation_id) => result,
                    };
                    let event = match result {
                        Ok(messages) => SessionEvent::HistoryLoaded {
                            generation,
                            messages,
                        },
                        Err(e) => SessionEvent::HistoryFailed {
                            generation,
                            error: format!("{:#}", e),
                        },
                    };
                    let _ = results.send(event).await;
                });
            }
            SessionEffect::Disconnect => {
                self.cancel.cancel();
            }
        }
    }
}
