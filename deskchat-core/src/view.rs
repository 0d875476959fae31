// ABOUTME: Display helpers shared by chat front ends: short ids, timestamps, status labels.
// ABOUTME: Pure functions; callers pick the timezone and the current time.

use chrono::{DateTime, TimeZone};

use crate::connection::ConnectionState;
use crate::model::{ConversationStatus, Message};

/// Last eight characters of an id, uppercased (e.g. order numbers in headers)
pub fn short_id(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    let start = chars.len().saturating_sub(8);
    chars[start..].iter().collect::<String>().to_uppercase()
}

/// Hour and minute of a timestamp
pub fn format_time<Tz: TimeZone>(ts: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    ts.format("%H:%M").to_string()
}

/// Time for today, "Yesterday" for yesterday, otherwise the date
pub fn format_date<Tz: TimeZone>(ts: &DateTime<Tz>, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let day = ts.date_naive();
    let today = now.date_naive();
    if day == today {
        format_time(ts)
    } else if Some(day) == today.pred_opt() {
        "Yesterday".to_string()
    } else {
        ts.format("%Y-%m-%d").to_string()
    }
}

pub fn status_marker(status: ConversationStatus) -> &'static str {
    match status {
        ConversationStatus::Active => "●",
        ConversationStatus::Pending => "◐",
        ConversationStatus::Resolved => "✓",
    }
}

/// Admin header indicator
pub fn admin_connection_label(state: ConnectionState) -> &'static str {
    if state.is_connected() {
        "Online"
    } else {
        "Offline"
    }
}

/// Customer header indicator
pub fn customer_connection_label(state: ConnectionState) -> &'static str {
    if state.is_connected() {
        "Connected"
    } else {
        "Connecting..."
    }
}

/// Which side of the thread a message bubble sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Written by the viewer
    Own,
    Other,
}

pub fn bubble_side(message: &Message, viewer_id: &str) -> Side {
    if message.is_from(viewer_id) {
        Side::Own
    } else {
        Side::Other
    }
}
