// ABOUTME: TUI view modules rendering the content panes
// ABOUTME: The chat view is shared by the admin and customer surfaces

pub mod chat;
