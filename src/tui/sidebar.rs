// ABOUTME: Admin TUI sidebar with the conversation list and gateway status
// ABOUTME: Renders the list cursor, the open conversation, unread badges and the online indicator

use chrono::Local;
use deskchat_core::connection::ConnectionState;
use deskchat_core::model::Conversation;
use deskchat_core::view::{admin_connection_label, status_marker};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use super::app::AdminApp;
use super::format::{conversation_preview, conversation_title};
use super::theme;

/// Render the sidebar containing the conversation list and connection status
pub fn render_sidebar(frame: &mut Frame, area: Rect, app: &AdminApp) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(4)])
        .split(area);

    render_conversations(frame, layout[0], app);
    render_status(frame, layout[1], app);
}

fn conversation_item<'a>(conv: &'a Conversation, open: bool) -> ListItem<'a> {
    let mut heading = vec![
        Span::raw(if open { "▸ " } else { "  " }),
        Span::styled(
            format!("{} ", status_marker(conv.status)),
            Style::default().fg(theme::status_color(conv.status)),
        ),
        Span::styled(
            conversation_title(&conv.id),
            Style::default().fg(theme::TEXT_COLOR).add_modifier(if open {
                Modifier::BOLD
            } else {
                Modifier::empty()
            }),
        ),
    ];
    if conv.unread_count > 0 {
        heading.push(Span::styled(
            format!(" ({})", conv.unread_count),
            Style::default().fg(theme::UNREAD_COLOR).add_modifier(Modifier::BOLD),
        ));
    }
    let preview = Line::styled(
        format!("    {}", conversation_preview(conv, &Local::now())),
        Style::default().fg(theme::DIM_TEXT),
    );
    ListItem::new(Text::from(vec![Line::from(heading), preview]))
}

fn render_conversations(frame: &mut Frame, area: Rect, app: &AdminApp) {
    let conversations = &app.snapshot.conversations;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Conversations ({}) ", conversations.len()))
        .title_style(Style::default().fg(theme::NAV_HEADER).add_modifier(Modifier::BOLD))
        .border_style(Style::default().fg(theme::BORDER_COLOR));

    if conversations.is_empty() {
        let empty = Paragraph::new("  No conversations yet")
            .style(Style::default().fg(theme::DIM_TEXT))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let open = app.snapshot.view.selected();
    let items: Vec<ListItem> = conversations
        .iter()
        .map(|conv| conversation_item(conv, open == Some(conv.id.as_str())))
        .collect();

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .fg(theme::SELECTED_FG)
            .bg(theme::SELECTED_BG),
    );
    let mut state = ListState::default().with_selected(Some(app.list_cursor));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_status(frame: &mut Frame, area: Rect, app: &AdminApp) {
    let connected = app.snapshot.connected;
    let state = if connected {
        ConnectionState::Connected
    } else {
        ConnectionState::Disconnected
    };
    let indicator = if connected { "●" } else { "○" };

    let lines = vec![
        Line::from(vec![
            Span::styled(
                format!("  {} ", indicator),
                Style::default().fg(theme::connection_color(connected)),
            ),
            Span::styled(admin_connection_label(state), Style::default().fg(theme::TEXT_COLOR)),
        ]),
        Line::styled(
            format!("  {} unread", app.snapshot.total_unread),
            Style::default().fg(theme::DIM_TEXT),
        ),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Gateway ")
        .border_style(Style::default().fg(theme::BORDER_COLOR));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
