// ABOUTME: Input layer for the chat TUIs: the single-line input box and slash-command parsing
// ABOUTME: Turns submitted lines into commands and resolves conversation references

use crossterm::event::{KeyCode, KeyEvent};
use deskchat_core::model::Conversation;
use deskchat_core::view::short_id;

pub const ADMIN_HELP: &str = "/select <number|id>, /list (refresh), /status, /quit. Anything else is sent.";
pub const CUSTOMER_HELP: &str = "/status, /quit. Anything else is sent to support.";

// =============================================================================
// Commands
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Select(String),
    Status,
    Quit,
    Help,
    /// Unrecognized slash command
    Unknown(String),
    /// Plain text to send
    Say(String),
    Nothing,
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Command::Nothing;
    }

    let Some(rest) = line.trim_start().strip_prefix('/') else {
        return Command::Say(line.to_string());
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name {
        "list" | "l" => Command::List,
        "select" | "s" if !arg.is_empty() => Command::Select(arg.to_string()),
        "status" => Command::Status,
        "quit" | "q" | "exit" => Command::Quit,
        "help" | "h" | "?" => Command::Help,
        other => Command::Unknown(other.to_string()),
    }
}

/// Resolve `/select` input: 1-based list position, full id, or short id
pub fn resolve_selection(arg: &str, conversations: &[Conversation]) -> Option<String> {
    if let Ok(position) = arg.parse::<usize>() {
        if let Some(conv) = position.checked_sub(1).and_then(|i| conversations.get(i)) {
            return Some(conv.id.clone());
        }
    }
    if let Some(conv) = conversations.iter().find(|c| c.id == arg) {
        return Some(conv.id.clone());
    }
    let wanted = arg.to_uppercase();
    conversations
        .iter()
        .find(|c| short_id(&c.id) == wanted)
        .map(|c| c.id.clone())
}

// =============================================================================
// Input box
// =============================================================================

/// What a key did to the input box
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    Editing,
    /// Enter pressed; the box is cleared
    Submitted(String),
    /// Esc pressed; the text is kept for later
    Left,
}

#[derive(Debug, Default)]
pub struct InputBox {
    pub buffer: String,
    pub active: bool,
}

impl InputBox {
    pub fn handle_key(&mut self, key: KeyEvent) -> InputOutcome {
        match key.code {
            KeyCode::Esc => {
                self.active = false;
                InputOutcome::Left
            }
            KeyCode::Enter => InputOutcome::Submitted(std::mem::take(&mut self.buffer)),
            KeyCode::Backspace => {
                self.buffer.pop();
                InputOutcome::Editing
            }
            KeyCode::Char(c) => {
                self.buffer.push(c);
                InputOutcome::Editing
            }
            _ => InputOutcome::Editing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("/list"), Command::List);
        assert_eq!(parse_command("/select 2"), Command::Select("2".to_string()));
        assert_eq!(parse_command("/s order_1 "), Command::Select("order_1".to_string()));
        assert_eq!(parse_command("/quit\n"), Command::Quit);
        assert_eq!(parse_command("/status"), Command::Status);
        assert_eq!(parse_command("/select"), Command::Unknown("select".to_string()));
        assert_eq!(parse_command("/dance"), Command::Unknown("dance".to_string()));
        assert_eq!(parse_command("   "), Command::Nothing);
        assert_eq!(parse_command("hello there"), Command::Say("hello there".to_string()));
    }

    #[test]
    fn test_resolve_selection() {
        let conversations = vec![
            Conversation::new("order_65f0c2a9b1d3e4f5"),
            Conversation::new("general"),
        ];
        assert_eq!(
            resolve_selection("1", &conversations).as_deref(),
            Some("order_65f0c2a9b1d3e4f5")
        );
        assert_eq!(resolve_selection("general", &conversations).as_deref(), Some("general"));
        assert_eq!(
            resolve_selection("b1d3e4f5", &conversations).as_deref(),
            Some("order_65f0c2a9b1d3e4f5")
        );
        assert_eq!(resolve_selection("3", &conversations), None);
        assert_eq!(resolve_selection("0", &conversations), None);
        assert_eq!(resolve_selection("nope", &conversations), None);
    }

    #[test]
    fn test_input_box_editing() {
        let mut input = InputBox {
            active: true,
            ..InputBox::default()
        };
        input.handle_key(key(KeyCode::Char('h')));
        input.handle_key(key(KeyCode::Char('i')));
        input.handle_key(key(KeyCode::Char('!')));
        assert_eq!(input.handle_key(key(KeyCode::Backspace)), InputOutcome::Editing);
        assert_eq!(input.buffer, "hi");

        assert_eq!(
            input.handle_key(key(KeyCode::Enter)),
            InputOutcome::Submitted("hi".to_string())
        );
        assert!(input.buffer.is_empty());
        assert!(input.active);
    }

    #[test]
    fn test_input_box_esc_keeps_text() {
        let mut input = InputBox {
            buffer: "half a thought".to_string(),
            active: true,
        };
        assert_eq!(input.handle_key(key(KeyCode::Esc)), InputOutcome::Left);
        assert!(!input.active);
        assert_eq!(input.buffer, "half a thought");
    }
}
