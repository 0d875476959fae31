// ABOUTME: Platform-agnostic realtime support chat: connection, directory, streams, sessions
// ABOUTME: Provides the state machines and drivers; transports and REST live in the binary crate

pub mod backoff;
pub mod connection;
pub mod console;
pub mod dashboard;
pub mod directory;
pub mod events;
pub mod metrics;
pub mod model;
pub mod session;
pub mod stream;
pub mod traits;
pub mod view;
pub mod widget;

pub use connection::{ConnectionConfig, ConnectionHandle, ConnectionManager, ConnectionState};
pub use console::AdminConsole;
pub use dashboard::{AdminDashboard, DashboardEvent, DashboardOptions, DashboardSnapshot, ViewState};
pub use directory::ConversationDirectory;
pub use events::{ClientEvent, OutgoingMessage, ServerEvent, TransportEvent};
pub use model::{conversation_id_for_order, Conversation, ConversationStatus, CreateConversation, Message};
pub use session::{CustomerSession, SessionEvent, SessionPhase, SessionSnapshot};
pub use stream::MessageStream;
pub use traits::{ChatBackend, Connector, Link};
pub use widget::CustomerChat;
