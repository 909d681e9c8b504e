pub mod config;
pub mod conversation;
pub mod error;
pub mod session;
pub mod transport;

// Re-export key types
pub use config::Settings;
pub use conversation::{
    ChatEvent, ChatEventKind, ConversationManager, ConversationState, DeliveryMode, Message,
    Phase, Sender, Source,
};
pub use error::{ChatError, Result};
pub use session::{FileSessionStore, MemorySessionStore, SessionStore};
pub use transport::{ChatBackend, ChatReply, EventStream, HttpChatClient, StreamEvent};
