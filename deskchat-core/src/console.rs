// ABOUTME: Async driver for the admin dashboard: one task owns the state and runs its effects.
// ABOUTME: REST fetches run on spawned tasks and report back into the same event queue.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::connection::ConnectionManager;
use crate::dashboard::{AdminDashboard, DashboardEvent, DashboardOptions, DashboardSnapshot, Effect};
use crate::events::TransportEvent;
use crate::traits::ChatBackend;

/// Handle to a running admin dashboard
pub struct AdminConsole {
    events: mpsc::Sender<DashboardEvent>,
    snapshots: watch::Receiver<DashboardSnapshot>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl AdminConsole {
    /// Start the dashboard on a shared connection.
    ///
    /// Connects the manager if it is not already connected; the console never
    /// disconnects it, since other admin surfaces may share it.
    pub fn start(
        connection: Arc<ConnectionManager>,
        backend: Arc<dyn ChatBackend>,
        options: DashboardOptions,
    ) -> Self {
        let dashboard = AdminDashboard::new(options);
        let (snapshot_tx, snapshots) = watch::channel(dashboard.snapshot());
        let (events, events_rx) = mpsc::channel(128);
        let cancel = CancellationToken::new();

        // Subscribe before connecting so the first Connected is not missed
        let transport_rx = connection.subscribe();
        connection.connect();

        let driver = Driver {
            dashboard,
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

    /// Queue an operator action, waiting for room in the queue.
    /// Returns false if the console has stopped.
    pub async fn dispatch(&self, event: DashboardEvent) -> bool {
        self.events.send(event).await.is_ok()
    }

    pub async fn select(&self, conversation_id: impl Into<String>) -> bool {
        self.dispatch(DashboardEvent::Select(conversation_id.into())).await
    }

    pub async fn send(&self, text: impl Into<String>) -> bool {
        self.dispatch(DashboardEvent::Send(text.into())).await
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Watch for re-renders
    pub fn watch(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshots.clone()
    }

    /// Stop the driver; in-flight fetches are abandoned, not applied
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Err(e) = (&mut self.task).await {
            tracing::warn!(error = %e, "Admin console task ended abnormally");
        }
    }
}

impl Drop for AdminConsole {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Driver {
    dashboard: AdminDashboard,
    connection: Arc<ConnectionManager>,
    backend: Arc<dyn ChatBackend>,
    results: mpsc::Sender<DashboardEvent>,
    snapshots: watch::Sender<DashboardSnapshot>,
    cancel: CancellationToken,
}

impl Driver {
    async fn run(
        mut self,
        mut transport_rx: broadcast::Receiver<TransportEvent>,
        mut events_rx: mpsc::Receiver<DashboardEvent>,
    ) {
        if self.connection.is_connected() {
            self.dispatch(DashboardEvent::Transport(TransportEvent::Connected));
        }

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                event = transport_rx.recv() => match event {
                    Ok(event) => self.dispatch(DashboardEvent::Transport(event)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Admin console lagged behind gateway events");
                        self.dispatch(DashboardEvent::Resync);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                event = events_rx.recv() => match event {
                    Some(event) => self.dispatch(event),
                    None => break,
                },
            }
        }
        tracing::debug!("Admin console stopped");
    }

    fn dispatch(&mut self, event: DashboardEvent) {
        for effect in self.dashboard.handle(event) {
            self.execute(effect);
        }
        self.snapshots.send_replace(self.dashboard.snapshot());
    }

    fn execute(&self, effect: Effect) {
        match effect {
            Effect::Emit(event) => {
                self.connection.emit(event);
            }
            Effect::FetchConversations => {
                let backend = Arc::clone(&self.backend);
                let results = self.results.clone();
                let cancel = self.cancel.clone();
                tokio::spawn(async move {
                    let result = tokio::select! {
                        _ = cancel.cancelled() => return,
                        result = backend.list_conversations() => result,
                    };
                    let event = match result {
                        Ok(conversations) => DashboardEvent::ConversationsLoaded(conversations),
                        Err(e) => DashboardEvent::ConversationsFailed(format!("{:#}", e)),
                    };
                    let _ = results.send(event).await;
                });
            }
            Effect::FetchHistory {
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
                        Ok(messages) => DashboardEvent::HistoryLoaded {
                            conversation_id,
                            generation,
                            messages,
                        },
                        Err(e) => DashboardEvent::HistoryFailed {
                            conversation_id,
                            generation,
                            error: format!("{:#}", e),
                        },
                    };
                    let _ = results.send(event).await;
                });
            }
        }
    }
}
