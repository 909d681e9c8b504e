mod manager;
mod message;
mod state;

pub use manager::{
    ConversationManager, DeliveryMode, APOLOGY, HISTORY_ERROR, RESET_ERROR, SEND_ERROR,
};
pub use message::{Message, Sender, Source};
pub use state::{ChatEvent, ChatEventKind, ConversationState, Phase};
