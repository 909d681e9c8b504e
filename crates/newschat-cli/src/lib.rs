// Library interface for newschat-cli
// The binary and the integration tests share these modules.

pub mod app;
pub mod commands;
pub mod render;
pub mod theme;

// Re-export commonly used items for easier testing
pub use app::{AppState, ChatCommand};
pub use commands::{handle_command, CommandResult};
pub use theme::Theme;
