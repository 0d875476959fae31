// ABOUTME: Plain-text formatting of conversations and messages for the terminal
// ABOUTME: Shared by the TUI panes and the one-shot `conversations` listing

use chrono::{DateTime, TimeZone};
use deskchat_core::model::{Conversation, Message, ORDER_CONVERSATION_PREFIX};
use deskchat_core::view::{bubble_side, format_date, format_time, short_id, status_marker, Side};

/// "Order #B1D3E4F5" for order chats, the raw id otherwise
pub fn conversation_title(conversation_id: &str) -> String {
    match conversation_id.strip_prefix(ORDER_CONVERSATION_PREFIX) {
        Some(order_id) => format!("Order #{}", short_id(order_id)),
        None => conversation_id.to_string(),
    }
}

/// Marker, title and unread badge
pub fn conversation_heading(conv: &Conversation) -> String {
    let unread = if conv.unread_count > 0 {
        format!(" ({})", conv.unread_count)
    } else {
        String::new()
    };
    format!("{} {}{}", status_marker(conv.status), conversation_title(&conv.id), unread)
}

/// Last message preview, with its date when known
pub fn conversation_preview<Tz: TimeZone>(conv: &Conversation, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let last = conv.last_message.as_deref().unwrap_or("No messages yet");
    match conv.last_message_time {
        Some(t) => format!("{}  {}", last, format_date(&t.with_timezone(&now.timezone()), now)),
        None => last.to_string(),
    }
}

pub fn conversation_line<Tz: TimeZone>(position: usize, conv: &Conversation, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{:>3}. {}  {}",
        position,
        conversation_heading(conv),
        conversation_preview(conv, now)
    )
}

pub fn message_line<Tz: TimeZone>(message: &Message, viewer_id: &str, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let time = format_time(&message.created_at.with_timezone(tz));
    let author = match bubble_side(message, viewer_id) {
        Side::Own => "you",
        Side::Other => message.sender_id.as_str(),
    };
    let mut line = format!("[{}] {}: {}", time, author, message.text);
    if let Some(url) = &message.attachment_url {
        line.push_str(&format!(" <{}>", url));
    }
    line
}
