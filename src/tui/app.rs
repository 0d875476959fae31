// ABOUTME: Admin dashboard TUI state, key handling, and layout
// ABOUTME: Conversation list and thread panes over the console's snapshots

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use deskchat_core::connection::ConnectionState;
use deskchat_core::dashboard::{DashboardSnapshot, ViewState};
use deskchat_core::view::admin_connection_label;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use super::event::TuiEvent;
use super::format::conversation_title;
use super::input::{parse_command, resolve_selection, Command, InputBox, InputOutcome, ADMIN_HELP};
use super::sidebar;
use super::theme;
use super::views::chat::{input_height, render_input, render_thread, ThreadView};

/// Messages moved per PgUp/PgDn
pub const SCROLL_STEP: usize = 5;

// =============================================================================
// Event handling result
// =============================================================================

#[derive(Debug, PartialEq, Eq)]
pub enum EventResult<A> {
    Continue,
    Quit,
    /// Work for the chat driver
    Act(A),
}

#[derive(Debug, PartialEq, Eq)]
pub enum AdminAction {
    Select(String),
    Send(String),
    /// Reload the list and the open thread
    Refresh,
}

// =============================================================================
// AdminApp: admin dashboard state
// =============================================================================

pub struct AdminApp {
    pub admin_id: String,
    pub snapshot: DashboardSnapshot,
    /// Highlighted row of the conversation list
    pub list_cursor: usize,
    pub thread_scroll: usize,
    pub input: InputBox,
    /// One-line feedback shown in the status bar
    pub notice: Option<String>,
}

impl AdminApp {
    pub fn new(admin_id: impl Into<String>, snapshot: DashboardSnapshot) -> Self {
        let mut app = Self {
            admin_id: admin_id.into(),
            snapshot: DashboardSnapshot {
                view: ViewState::NoConversationSelected,
                ..snapshot.clone()
            },
            list_cursor: 0,
            thread_scroll: 0,
            input: InputBox::default(),
            notice: None,
        };
        app.apply_snapshot(snapshot);
        app
    }

    pub fn handle_event(&mut self, event: TuiEvent) -> EventResult<AdminAction> {
        match event {
            TuiEvent::Key(key) => self.handle_key(key),
            TuiEvent::Tick | TuiEvent::Session(_) => EventResult::Continue,
            TuiEvent::Dashboard(snapshot) => {
                self.apply_snapshot(snapshot);
                EventResult::Continue
            }
            TuiEvent::Stopped => EventResult::Quit,
        }
    }

    fn apply_snapshot(&mut self, snapshot: DashboardSnapshot) {
        let before = self.snapshot.view.selected().map(str::to_string);
        let after = snapshot.view.selected();
        if before.as_deref() != after {
            self.thread_scroll = 0;
            // Follow selections made elsewhere, e.g. auto-open of a new chat
            if let Some(index) = after.and_then(|id| snapshot.conversations.iter().position(|c| c.id == id)) {
                self.list_cursor = index;
            }
        }
        self.list_cursor = self
            .list_cursor
            .min(snapshot.conversations.len().saturating_sub(1));
        self.snapshot = snapshot;
    }

    fn handle_key(&mut self, key: KeyEvent) -> EventResult<AdminAction> {
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
            KeyCode::Up | KeyCode::Char('k') => {
                self.list_cursor = self.list_cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let max = self.snapshot.conversations.len().saturating_sub(1);
                if self.list_cursor < max {
                    self.list_cursor += 1;
                }
            }
            KeyCode::Enter => return self.open_highlighted(),
            KeyCode::Char('i') => self.input.active = true,
            KeyCode::Char('/') => {
                self.input.active = true;
                self.input.buffer = "/".to_string();
            }
            KeyCode::Char('r') => return EventResult::Act(AdminAction::Refresh),
            KeyCode::PageUp => {
                let max = self.snapshot.messages.len().saturating_sub(1);
                self.thread_scroll = (self.thread_scroll + SCROLL_STEP).min(max);
            }
            KeyCode::PageDown => {
                self.thread_scroll = self.thread_scroll.saturating_sub(SCROLL_STEP);
            }
            KeyCode::Esc => self.notice = None,
            _ => {}
        }
        EventResult::Continue
    }

    fn open_highlighted(&mut self) -> EventResult<AdminAction> {
        let Some(conv) = self.snapshot.conversations.get(self.list_cursor) else {
            return EventResult::Continue;
        };
        if self.snapshot.view.selected() == Some(conv.id.as_str()) {
            return EventResult::Continue;
        }
        EventResult::Act(AdminAction::Select(conv.id.clone()))
    }

    fn submit(&mut self, line: &str) -> EventResult<AdminAction> {
        self.notice = None;
        match parse_command(line) {
            Command::Nothing => EventResult::Continue,
            Command::Quit => EventResult::Quit,
            Command::Help => {
                self.notice = Some(ADMIN_HELP.to_string());
                EventResult::Continue
            }
            Command::Unknown(name) => {
                self.notice = Some(format!("Unknown command /{}. {}", name, ADMIN_HELP));
                EventResult::Continue
            }
            Command::List => {
                self.notice = Some("Refreshing conversations".to_string());
                EventResult::Act(AdminAction::Refresh)
            }
            Command::Status => {
                self.notice = Some(self.status_summary());
                EventResult::Continue
            }
            Command::Select(arg) => match resolve_selection(&arg, &self.snapshot.conversations) {
                Some(id) => EventResult::Act(AdminAction::Select(id)),
                None => {
                    self.notice = Some(format!("No conversation matches '{}'", arg));
                    EventResult::Continue
                }
            },
            Command::Say(text) => {
                if self.snapshot.view.selected().is_none() {
                    self.notice = Some("Select a conversation first (j/k, Enter or /select <number>)".to_string());
                    EventResult::Continue
                } else if !self.snapshot.connected {
                    self.notice = Some("Offline, message not sent".to_string());
                    EventResult::Continue
                } else {
                    self.thread_scroll = 0;
                    EventResult::Act(AdminAction::Send(text))
                }
            }
        }
    }

    fn connection_label(&self) -> &'static str {
        admin_connection_label(if self.snapshot.connected {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        })
    }

    fn status_summary(&self) -> String {
        let selected = self
            .snapshot
            .view
            .selected()
            .map(conversation_title)
            .unwrap_or_else(|| "none".to_string());
        format!(
            "{} | {} conversations | {} unread | selected: {}",
            self.connection_label(),
            self.snapshot.conversations.len(),
            self.snapshot.total_unread,
            selected
        )
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        // Split into sidebar and main content
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(38), Constraint::Min(40)])
            .split(area);

        sidebar::render_sidebar(frame, layout[0], self);

        // Thread, input, status bar
        let main_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(input_height(&self.input)),
                Constraint::Length(1),
            ])
            .split(layout[1]);

        self.render_thread(frame, main_layout[0]);
        render_input(
            frame,
            main_layout[1],
            &self.input,
            "i: reply | /: command | j/k Enter: open | r: refresh | PgUp/PgDn: scroll",
        );
        self.render_status_bar(frame, main_layout[2]);
    }

    fn render_thread(&self, frame: &mut Frame, area: Rect) {
        let (title, placeholder) = match &self.snapshot.view {
            ViewState::NoConversationSelected => (
                "No conversation selected".to_string(),
                Some("Pick a conversation from the list: j/k to move, Enter to open"),
            ),
            ViewState::LoadingHistory { conversation_id } => {
                (conversation_title(conversation_id), Some("Loading messages..."))
            }
            ViewState::Live { conversation_id } => (conversation_title(conversation_id), None),
        };
        let thread = ThreadView {
            title,
            messages: &self.snapshot.messages,
            viewer_id: &self.admin_id,
            placeholder,
            scroll: self.thread_scroll,
        };
        render_thread(frame, area, &thread);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let mode_indicator = if self.input.active { "INSERT" } else { "NORMAL" };
        let text = match &self.notice {
            Some(notice) => notice.clone(),
            None if self.input.active => "Esc: leave input | Enter: send".to_string(),
            None => "q: quit".to_string(),
        };

        let status = Paragraph::new(Line::from(vec![
            Span::raw(format!(" {} | ", mode_indicator)),
            Span::styled(
                self.connection_label(),
                Style::default().fg(theme::connection_color(self.snapshot.connected)),
            ),
            Span::raw(format!(" | {} ", text)),
        ]))
        .style(Style::default().fg(Color::White).bg(theme::STATUS_BAR_BG));

        frame.render_widget(status, area);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use deskchat_core::model::{Conversation, Message};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn key(code: KeyCode) -> TuiEvent {
        TuiEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_line(app: &mut AdminApp, text: &str) -> EventResult<AdminAction> {
        for c in text.chars() {
            app.handle_event(key(KeyCode::Char(c)));
        }
        app.handle_event(key(KeyCode::Enter))
    }

    fn message(id: &str, sender: &str, text: &str) -> Message {
        Message {
            id: id.to_string(),
            conversation_id: "order_65f0c2a9b1d3e4f5".to_string(),
            sender_id: sender.to_string(),
            text: text.to_string(),
            attachment_url: None,
            message_type: Default::default(),
            is_read: false,
            created_at: Utc.with_ymd_and_hms(2024, 3, 10, 9, 5, 0).unwrap(),
        }
    }

    fn snapshot(view: ViewState) -> DashboardSnapshot {
        DashboardSnapshot {
            connected: true,
            view,
            conversations: vec![
                Conversation::new("order_65f0c2a9b1d3e4f5"),
                Conversation::new("general"),
            ],
            messages: vec![],
            draft: String::new(),
            total_unread: 0,
        }
    }

    fn idle_app() -> AdminApp {
        AdminApp::new("admin", snapshot(ViewState::NoConversationSelected))
    }

    fn rendered(app: &AdminApp) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_quit_on_q() {
        let mut app = idle_app();
        assert_eq!(app.handle_event(key(KeyCode::Char('q'))), EventResult::Quit);
    }

    #[test]
    fn test_quit_on_ctrl_c_even_while_typing() {
        let mut app = idle_app();
        app.input.active = true;
        let result = app.handle_event(TuiEvent::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )));
        assert_eq!(result, EventResult::Quit);
    }

    #[test]
    fn test_q_does_not_quit_in_input_mode() {
        let mut app = idle_app();
        app.handle_event(key(KeyCode::Char('i')));
        assert_eq!(app.handle_event(key(KeyCode::Char('q'))), EventResult::Continue);
        assert_eq!(app.input.buffer, "q");
    }

    #[test]
    fn test_cursor_moves_and_enter_opens() {
        let mut app = idle_app();
        app.handle_event(key(KeyCode::Down));
        assert_eq!(app.list_cursor, 1);
        // Bottom stays at bottom
        app.handle_event(key(KeyCode::Char('j')));
        assert_eq!(app.list_cursor, 1);

        assert_eq!(
            app.handle_event(key(KeyCode::Enter)),
            EventResult::Act(AdminAction::Select("general".to_string()))
        );

        app.handle_event(key(KeyCode::Up));
        app.handle_event(key(KeyCode::Up));
        assert_eq!(app.list_cursor, 0);
    }

    #[test]
    fn test_enter_on_open_conversation_does_nothing() {
        let mut app = AdminApp::new(
            "admin",
            snapshot(ViewState::Live {
                conversation_id: "general".to_string(),
            }),
        );
        assert_eq!(app.list_cursor, 1);
        assert_eq!(app.handle_event(key(KeyCode::Enter)), EventResult::Continue);
    }

    #[test]
    fn test_select_command_resolves_position_and_short_id() {
        let mut app = idle_app();
        app.handle_event(key(KeyCode::Char('i')));
        assert_eq!(
            type_line(&mut app, "/select 2"),
            EventResult::Act(AdminAction::Select("general".to_string()))
        );
        assert_eq!(
            type_line(&mut app, "/s b1d3e4f5"),
            EventResult::Act(AdminAction::Select("order_65f0c2a9b1d3e4f5".to_string()))
        );
        assert_eq!(type_line(&mut app, "/select 9"), EventResult::Continue);
        assert_eq!(app.notice.as_deref(), Some("No conversation matches '9'"));
    }

    #[test]
    fn test_slash_key_starts_a_command() {
        let mut app = idle_app();
        app.handle_event(key(KeyCode::Char('/')));
        assert!(app.input.active);
        assert_eq!(type_line(&mut app, "list"), EventResult::Act(AdminAction::Refresh));
    }

    #[test]
    fn test_text_needs_selection_and_connection() {
        let mut app = idle_app();
        app.input.active = true;
        assert_eq!(type_line(&mut app, "hello"), EventResult::Continue);
        assert!(app.notice.as_deref().unwrap().starts_with("Select a conversation first"));

        let mut offline = snapshot(ViewState::Live {
            conversation_id: "general".to_string(),
        });
        offline.connected = false;
        app.handle_event(TuiEvent::Dashboard(offline.clone()));
        assert_eq!(type_line(&mut app, "hello"), EventResult::Continue);
        assert_eq!(app.notice.as_deref(), Some("Offline, message not sent"));

        offline.connected = true;
        app.handle_event(TuiEvent::Dashboard(offline));
        assert_eq!(
            type_line(&mut app, "hello"),
            EventResult::Act(AdminAction::Send("hello".to_string()))
        );
        assert!(app.notice.is_none());
        assert!(app.input.buffer.is_empty());
    }

    #[test]
    fn test_status_command_summarizes() {
        let mut app = AdminApp::new(
            "admin",
            snapshot(ViewState::Live {
                conversation_id: "order_65f0c2a9b1d3e4f5".to_string(),
            }),
        );
        app.input.active = true;
        type_line(&mut app, "/status");
        assert_eq!(
            app.notice.as_deref(),
            Some("Online | 2 conversations | 0 unread | selected: Order #B1D3E4F5")
        );
    }

    #[test]
    fn test_cursor_follows_selection_made_elsewhere() {
        let mut app = idle_app();
        let mut pushed = snapshot(ViewState::LoadingHistory {
            conversation_id: "order_new".to_string(),
        });
        pushed.conversations.insert(0, Conversation::new("order_new"));
        app.list_cursor = 2;
        app.thread_scroll = 4;

        app.handle_event(TuiEvent::Dashboard(pushed));
        assert_eq!(app.list_cursor, 0);
        assert_eq!(app.thread_scroll, 0);
    }

    #[test]
    fn test_cursor_clamped_when_list_shrinks() {
        let mut app = idle_app();
        app.list_cursor = 1;
        let mut shrunk = snapshot(ViewState::NoConversationSelected);
        shrunk.conversations.truncate(1);
        app.handle_event(TuiEvent::Dashboard(shrunk));
        assert_eq!(app.list_cursor, 0);
    }

    #[test]
    fn test_driver_stop_quits() {
        let mut app = idle_app();
        assert_eq!(app.handle_event(TuiEvent::Stopped), EventResult::Quit);
    }

    #[test]
    fn test_render_shows_list_thread_and_status() {
        let mut live = snapshot(ViewState::Live {
            conversation_id: "order_65f0c2a9b1d3e4f5".to_string(),
        });
        live.conversations[0].unread_count = 0;
        live.conversations[1].unread_count = 3;
        live.total_unread = 3;
        live.messages = vec![
            message("m1", "user42", "my key is not working"),
            message("m2", "admin", "Looking into it"),
        ];
        let app = AdminApp::new("admin", live);

        let screen = rendered(&app);
        assert!(screen.contains("Conversations (2)"));
        assert!(screen.contains("Order #B1D3E4F5"));
        assert!(screen.contains("general (3)"));
        assert!(screen.contains("user42: my key is not working"));
        assert!(screen.contains("you: Looking into it"));
        assert!(screen.contains("Online"));
        assert!(screen.contains("3 unread"));
    }

    #[test]
    fn test_render_placeholders() {
        let screen = rendered(&idle_app());
        assert!(screen.contains("No conversation selected"));

        let loading = AdminApp::new(
            "admin",
            snapshot(ViewState::LoadingHistory {
                conversation_id: "general".to_string(),
            }),
        );
        assert!(rendered(&loading).contains("Loading messages..."));

        let mut offline = snapshot(ViewState::NoConversationSelected);
        offline.connected = false;
        assert!(rendered(&AdminApp::new("admin", offline)).contains("Offline"));
    }

    #[test]
    fn test_render_input_box_while_typing() {
        let mut app = idle_app();
        app.handle_event(key(KeyCode::Char('i')));
        app.handle_event(key(KeyCode::Char('h')));
        app.handle_event(key(KeyCode::Char('i')));
        let screen = rendered(&app);
        assert!(screen.contains("INSERT"));
        assert!(screen.contains("hi\u{2588}"));
    }
}
