// ABOUTME: Customer support chat TUI: one thread and an input box over the widget's snapshots
// ABOUTME: Starts in input mode; the status bar carries the connection indicator

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use deskchat_core::connection::ConnectionState;
use deskchat_core::session::{SessionPhase, SessionSnapshot};
use deskchat_core::view::customer_connection_label;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use super::app::{EventResult, SCROLL_STEP};
use super::event::TuiEvent;
use super::format::conversation_title;
use super::input::{parse_command, Command, InputBox, InputOutcome, CUSTOMER_HELP};
use super::theme;
use super::views::chat::{input_height, render_input, render_thread, ThreadView};

#[derive(Debug, PartialEq, Eq)]
pub enum CustomerAction {
    Send(String),
}

pub struct CustomerApp {
    pub user_id: String,
    pub snapshot: SessionSnapshot,
    pub thread_scroll: usize,
    pub input: InputBox,
    pub notice: Option<String>,
}

impl CustomerApp {
    pub fn new(user_id: impl Into<String>, snapshot: SessionSnapshot) -> Self {
        Self {
            user_id: user_id.into(),
            snapshot,
            thread_scroll: 0,
            input: InputBox {
                active: true,
                ..InputBox::default()
            },
            notice: None,
        }
    }

    pub fn handle_event(&mut self, event: TuiEvent) -> EventResult<CustomerAction> {
        match event {
            TuiEvent::Key(key) => self.handle_key(key),
            TuiEvent::Tick | TuiEvent::Dashboard(_) => EventResult::Continue,
            TuiEvent::Session(snapshot) => {
                self.snapshot = snapshot;
                EventResult::Continue
            }
            TuiEvent::Stopped => EventResult::Quit,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> EventResult<CustomerAction> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return EventResult::Quit;
        }

        if self.input.active {
            return match self.input.handle_key(key) {
                InputOutcome::Submitted(line) => self.submit(&line),
                InputOutcome::Editing | InputOutcome::Left => EventResult::Continue,
            };
        }

        match key.code {
            KeyCode::Char('q') => return EventResult::Quit,
            KeyCode::Char('i') | KeyCode::Enter => self.input.active = true,
            KeyCode::PageUp | KeyCode::Up | KeyCode::Char('k') => {
                let max = self.snapshot.messages.len().saturating_sub(1);
                self.thread_scroll = (self.thread_scroll + SCROLL_STEP).min(max);
            }
            KeyCode::PageDown | KeyCode::Down | KeyCode::Char('j') => {
                self.thread_scroll = self.thread_scroll.saturating_sub(SCROLL_STEP);
            }
            KeyCode::Esc => self.notice = None,
            _ => {}
        }
        EventResult::Continue
    }

    fn submit(&mut self, line: &str) -> EventResult<CustomerAction> {
        self.notice = None;
        match parse_command(line) {
            Command::Nothing => EventResult::Continue,
            Command::Quit => EventResult::Quit,
            Command::Status => {
                self.notice = Some(format!(
                    "{} | {} | {} messages",
                    self.connection_label(),
                    conversation_title(&self.snapshot.conversation_id),
                    self.snapshot.messages.len()
                ));
                EventResult::Continue
            }
            Command::Help | Command::List | Command::Select(_) | Command::Unknown(_) => {
                self.notice = Some(CUSTOMER_HELP.to_string());
                EventResult::Continue
            }
            Command::Say(text) => {
                if self.snapshot.phase == SessionPhase::Closed {
                    self.notice = Some("Chat closed".to_string());
                    EventResult::Continue
                } else if !self.snapshot.connected {
                    self.notice = Some("Still connecting, message not sent".to_string());
                    EventResult::Continue
                } else {
                    self.thread_scroll = 0;
                    EventResult::Act(CustomerAction::Send(text))
                }
            }
        }
    }

    fn connection_label(&self) -> &'static str {
        customer_connection_label(if self.snapshot.connected {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        })
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    pub fn render(&self, frame: &mut Frame) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(input_height(&self.input)),
                Constraint::Length(1),
            ])
            .split(frame.area());

        let placeholder = match self.snapshot.phase {
            SessionPhase::Connecting => Some("Connecting to support..."),
            SessionPhase::EnsuringConversation | SessionPhase::LoadingHistory => {
                Some("Loading your conversation...")
            }
            SessionPhase::Live => None,
            SessionPhase::Closed => Some("Chat closed"),
        };
        let thread = ThreadView {
            title: format!(
                "Support chat · {}",
                conversation_title(&self.snapshot.conversation_id)
            ),
            messages: &self.snapshot.messages,
            viewer_id: &self.user_id,
            placeholder,
            scroll: self.thread_scroll,
        };
        render_thread(frame, layout[0], &thread);
        render_input(
            frame,
            layout[1],
            &self.input,
            "i: type message | PgUp/PgDn: scroll | q: quit",
        );
        self.render_status_bar(frame, layout[2]);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let connected = self.snapshot.connected;
        let indicator = if connected { "●" } else { "○" };
        let text = match &self.notice {
            Some(notice) => notice.clone(),
            None if self.input.active => "Esc: leave input | Enter: send".to_string(),
            None => "q: quit".to_string(),
        };

        let status = Paragraph::new(Line::from(vec![
            Span::styled(
                format!(" {} {}", indicator, self.connection_label()),
                Style::default().fg(theme::connection_color(connected)),
            ),
            Span::raw(format!(" | {} ", text)),
        ]))
        .style(Style::default().fg(Color::White).bg(theme::STATUS_BAR_BG));

        frame.render_widget(status, area);
    }
}
