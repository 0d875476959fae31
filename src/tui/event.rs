// ABOUTME: TUI event system merging keyboard, tick, and chat snapshot events
// ABOUTME: Each source runs as its own task feeding a single mpsc channel

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use deskchat_core::dashboard::DashboardSnapshot;
use deskchat_core::session::SessionSnapshot;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

// =============================================================================
// TuiEvent: unified event type for the TUI event loop
// =============================================================================

#[derive(Debug)]
pub enum TuiEvent {
    /// Keyboard input from crossterm
    Key(KeyEvent),
    /// Periodic render tick (100ms)
    Tick,
    /// New admin dashboard state
    Dashboard(DashboardSnapshot),
    /// New customer chat state
    Session(SessionSnapshot),
    /// The chat driver went away
    Stopped,
}

// =============================================================================
// Event source spawning
// =============================================================================

/// Spawn the keyboard and tick tasks
pub fn spawn_event_tasks(tx: mpsc::Sender<TuiEvent>) {
    spawn_keyboard_task(tx.clone());
    spawn_tick_task(tx);
}

/// Forward every snapshot the driver publishes, starting with the current one
pub fn spawn_snapshot_task<T, F>(mut snapshots: watch::Receiver<T>, tx: mpsc::Sender<TuiEvent>, wrap: F)
where
    T: Clone + Send + Sync + 'static,
    F: Fn(T) -> TuiEvent + Send + 'static,
{
    tokio::spawn(async move {
        let current = snapshots.borrow_and_update().clone();
        if tx.send(wrap(current)).await.is_err() {
            return;
        }
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            if tx.send(wrap(snapshot)).await.is_err() {
                return;
            }
        }
        tracing::debug!("Chat driver stopped publishing snapshots");
        let _ = tx.send(TuiEvent::Stopped).await;
    });
}

/// Spawn keyboard input polling task
fn spawn_keyboard_task(tx: mpsc::Sender<TuiEvent>) {
    tokio::spawn(async move {
        loop {
            // crossterm event polling is blocking, run in spawn_blocking
            let event = tokio::task::spawn_blocking(|| {
                if event::poll(Duration::from_millis(50)).unwrap_or(false) {
                    event::read().ok()
                } else {
                    None
                }
            })
            .await;

            match event {
                Ok(Some(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    if tx.send(TuiEvent::Key(key)).await.is_err() {
                        break;
                    }
                }
                Ok(_) => {} // Mouse events, resize: the next tick redraws
                Err(_) => break,
            }
        }
    });
}

/// Spawn tick task for periodic re-renders
fn spawn_tick_task(tx: mpsc::Sender<TuiEvent>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(100));
        loop {
            interval.tick().await;
            if tx.send(TuiEvent::Tick).await.is_err() {
                break;
            }
        }
    });
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tui_event_debug() {
        let event = TuiEvent::Tick;
        assert_eq!(format!("{:?}", event), "Tick");
    }

    fn snapshot(connected: bool) -> DashboardSnapshot {
        DashboardSnapshot {
            connected,
            view: deskchat_core::dashboard::ViewState::NoConversationSelected,
            conversations: vec![],
            messages: vec![],
            draft: String::new(),
            total_unread: 0,
        }
    }

    #[tokio::test]
    async fn test_snapshot_task_forwards_current_then_changes_then_stop() {
        let (publish, snapshots) = watch::channel(snapshot(false));
        let (tx, mut rx) = mpsc::channel(8);
        spawn_snapshot_task(snapshots, tx, TuiEvent::Dashboard);

        match rx.recv().await {
            Some(TuiEvent::Dashboard(s)) => assert!(!s.connected),
            other => panic!("unexpected event {:?}", other),
        }
        publish.send(snapshot(true)).unwrap();
        match rx.recv().await {
            Some(TuiEvent::Dashboard(s)) => assert!(s.connected),
            other => panic!("unexpected event {:?}", other),
        }
        drop(publish);
        assert!(matches!(rx.recv().await, Some(TuiEvent::Stopped)));
        assert!(rx.recv().await.is_none());
    }
}
