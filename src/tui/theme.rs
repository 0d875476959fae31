// ABOUTME: TUI color theme for the chat surfaces
// ABOUTME: Panel, selection, connection and conversation status colors

use deskchat_core::model::ConversationStatus;
use ratatui::prelude::Color;

// =============================================================================
// Global theme colors
// =============================================================================

/// Main text color
pub const TEXT_COLOR: Color = Color::White;

/// Dimmed/secondary text
pub const DIM_TEXT: Color = Color::DarkGray;

/// Border color for panels
pub const BORDER_COLOR: Color = Color::Gray;

/// Status bar background
pub const STATUS_BAR_BG: Color = Color::DarkGray;

/// Selected/highlighted item
pub const SELECTED_BG: Color = Color::Blue;

/// Selected item text
pub const SELECTED_FG: Color = Color::White;

/// Panel titles and the active input border
pub const NAV_HEADER: Color = Color::Yellow;

/// Connected status indicator
pub const CONNECTED_COLOR: Color = Color::Green;

/// Disconnected status indicator
pub const DISCONNECTED_COLOR: Color = Color::Red;

/// The viewer's own messages
pub const OWN_MESSAGE: Color = Color::Cyan;

/// Unread badges
pub const UNREAD_COLOR: Color = Color::LightRed;

pub fn connection_color(connected: bool) -> Color {
    if connected {
        CONNECTED_COLOR
    } else {
        DISCONNECTED_COLOR
    }
}

pub fn status_color(status: ConversationStatus) -> Color {
    match status {
        ConversationStatus::Active => Color::Green,
        ConversationStatus::Pending => Color::Yellow,
        ConversationStatus::Resolved => DIM_TEXT,
    }
}
