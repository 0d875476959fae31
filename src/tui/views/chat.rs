// ABOUTME: Thread pane and input box shared by the admin and customer TUIs
// ABOUTME: Renders the newest messages that fit, own messages right-aligned

use chrono::Local;
use deskchat_core::model::Message;
use deskchat_core::view::{bubble_side, Side};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};

use crate::tui::format::message_line;
use crate::tui::input::InputBox;
use crate::tui::theme;

/// What the thread pane shows
pub struct ThreadView<'a> {
    pub title: String,
    pub messages: &'a [Message],
    pub viewer_id: &'a str,
    /// Shown instead of the messages when set
    pub placeholder: Option<&'a str>,
    /// Messages scrolled back from the newest
    pub scroll: usize,
}

/// Height of the input row: a bordered box while typing, a hint line otherwise
pub fn input_height(input: &InputBox) -> u16 {
    if input.active {
        3
    } else {
        1
    }
}

pub fn render_thread(frame: &mut Frame, area: Rect, thread: &ThreadView) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", thread.title))
        .title_style(Style::default().fg(theme::NAV_HEADER).add_modifier(Modifier::BOLD))
        .border_style(Style::default().fg(theme::BORDER_COLOR));

    let placeholder = thread
        .placeholder
        .or_else(|| thread.messages.is_empty().then_some("No messages yet"));
    if let Some(text) = placeholder {
        let paragraph = Paragraph::new(format!("  {}", text))
            .style(Style::default().fg(theme::DIM_TEXT))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let visible_height = area.height.saturating_sub(2) as usize;
    let total = thread.messages.len();
    let end = total - thread.scroll.min(total.saturating_sub(1));
    let start = end.saturating_sub(visible_height);

    let items: Vec<ListItem> = thread.messages[start..end]
        .iter()
        .map(|message| {
            let text = message_line(message, thread.viewer_id, &Local);
            let line = match bubble_side(message, thread.viewer_id) {
                Side::Own => Line::styled(text, Style::default().fg(theme::OWN_MESSAGE))
                    .alignment(Alignment::Right),
                Side::Other => Line::styled(text, Style::default().fg(theme::TEXT_COLOR)),
            };
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items).block(block);
    frame.render_widget(list, area);
}

pub fn render_input(frame: &mut Frame, area: Rect, input: &InputBox, hint: &str) {
    if input.active {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Send (Esc to leave, Enter to send) ")
            .border_style(Style::default().fg(theme::NAV_HEADER));

        let input_text = format!("{}\u{2588}", input.buffer); // Block cursor
        let paragraph = Paragraph::new(input_text)
            .style(Style::default().fg(theme::TEXT_COLOR))
            .block(block)
            .wrap(Wrap { trim: false });

        frame.render_widget(paragraph, area);
    } else {
        let paragraph = Paragraph::new(format!(" {}", hint)).style(
            Style::default()
                .fg(Color::White)
                .bg(theme::STATUS_BAR_BG),
        );
        frame.render_widget(paragraph, area);
    }
}
