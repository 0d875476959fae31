// ABOUTME: TUI module entry point with terminal setup, teardown, and panic hook
// ABOUTME: Provides run_admin() and run_customer() driving the chat consoles from the terminal

pub mod app;
pub mod customer;
pub mod event;
pub mod format;
pub mod input;
pub mod sidebar;
pub mod theme;
pub mod views;

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use deskchat_core::console::AdminConsole;
use deskchat_core::dashboard::DashboardEvent;
use deskchat_core::widget::CustomerChat;
use ratatui::prelude::*;
use std::io;
use tokio::sync::mpsc;

use app::{AdminAction, AdminApp, EventResult};
use customer::{CustomerAction, CustomerApp};
use event::TuiEvent;

type Term = Terminal<CrosstermBackend<io::Stdout>>;

/// Run the admin dashboard until the operator quits
pub async fn run_admin(console: &AdminConsole, admin_id: &str) -> Result<()> {
    let terminal = setup_terminal()?;
    let result = admin_loop(terminal, console, admin_id).await;
    restore_terminal()?;
    result
}

/// Run a customer chat until the customer quits. The caller closes the chat afterwards.
pub async fn run_customer(chat: &CustomerChat, user_id: &str) -> Result<()> {
    let terminal = setup_terminal()?;
    let result = customer_loop(terminal, chat, user_id).await;
    restore_terminal()?;
    result
}

/// Initialize the terminal for TUI rendering
fn setup_terminal() -> Result<Term> {
    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;

    Ok(terminal)
}

/// Restore the terminal to its original state
fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

async fn admin_loop(mut terminal: Term, console: &AdminConsole, admin_id: &str) -> Result<()> {
    let (event_tx, mut event_rx) = mpsc::channel(256);
    let mut app = AdminApp::new(admin_id, console.snapshot());

    event::spawn_event_tasks(event_tx.clone());
    event::spawn_snapshot_task(console.watch(), event_tx, TuiEvent::Dashboard);

    loop {
        terminal.draw(|frame| app.render(frame))?;

        let Some(event) = event_rx.recv().await else {
            // All event senders dropped
            break;
        };
        let delivered = match app.handle_event(event) {
            EventResult::Continue => true,
            EventResult::Quit => break,
            EventResult::Act(AdminAction::Select(id)) => {
                tracing::debug!(conversation_id = %id, "Operator opened conversation");
                console.select(id).await
            }
            EventResult::Act(AdminAction::Send(text)) => console.send(text).await,
            EventResult::Act(AdminAction::Refresh) => console.dispatch(DashboardEvent::Resync).await,
        };
        if !delivered {
            tracing::warn!("Admin console stopped, leaving the dashboard");
            break;
        }
    }

    Ok(())
}

async fn customer_loop(mut terminal: Term, chat: &CustomerChat, user_id: &str) -> Result<()> {
    let (event_tx, mut event_rx) = mpsc::channel(256);
    let mut app = CustomerApp::new(user_id, chat.snapshot());

    event::spawn_event_tasks(event_tx.clone());
    event::spawn_snapshot_task(chat.watch(), event_tx, TuiEvent::Session);

    loop {
        terminal.draw(|frame| app.render(frame))?;

        let Some(event) = event_rx.recv().await else {
            break;
        };
        match app.handle_event(event) {
            EventResult::Continue => {}
            EventResult::Quit => break,
            EventResult::Act(CustomerAction::Send(text)) => {
                if !chat.send(text).await {
                    tracing::warn!("Customer chat stopped, leaving");
                    break;
                }
            }
        }
    }

    Ok(())
}
