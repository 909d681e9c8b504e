/// Result of processing a slash command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Display a message to the user.
    Message(String),
    /// Clear the conversation and start a new session.
    Reset,
    /// Quit the application.
    Quit,
    /// Show the current session id and backend.
    ShowSession,
    /// Switch reply delivery. `None` toggles.
    SetStreaming(Option<bool>),
    /// Change the theme.
    ThemeChanged(String),
    /// Not a command - treat as chat text.
    NotACommand,
}

pub fn handle_command(input: &str) -> CommandResult {
    if !input.starts_with('/') {
        return CommandResult::NotACommand;
    }

    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/help" | "/h" => show_help(),
        "/exit" | "/quit" | "/q" => CommandResult::Quit,
        "/reset" | "/new" | "/clear" => CommandResult::Reset,
        "/session" => CommandResult::ShowSession,

        "/stream" => match arg {
            "" => CommandResult::SetStreaming(None),
            "on" => CommandResult::SetStreaming(Some(true)),
            "off" => CommandResult::SetStreaming(Some(false)),
            _ => CommandResult::Message("Usage: /stream [on|off]".into()),
        },

        "/theme" => {
            if arg.is_empty() {
                let themes = crate::theme::Theme::all_names().join(", ");
                CommandResult::Message(format!(
                    "Available themes: {themes}\nUsage: /theme <theme-name>"
                ))
            } else {
                CommandResult::ThemeChanged(arg.to_string())
            }
        }

        "/version" => {
            CommandResult::Message(format!("newschat v{}", env!("CARGO_PKG_VERSION")))
        }

        _ => CommandResult::Message(format!("Unknown command: {cmd}. Type /help for commands.")),
    }
}

fn show_help() -> CommandResult {
    let help_text = "\
╭─ newschat Commands ─────────────────────────────────────╮

  CONVERSATION
    /reset, /new, /clear      Clear the chat and start a new session
    /session                  Show the current session id
    /stream [on|off]          Toggle streamed replies

  DISPLAY
    /theme <name>             Change color theme

  OTHER
    /help, /h                 Show this help message
    /version                  Show version information
    /exit, /quit, /q          Quit the application

  KEYS
    Enter                     Send message
    Shift+Enter, Alt+Enter    Insert a newline
    Ctrl+R                    Reset chat
    Up/Down, PgUp/PgDn        Scroll
    Esc, Ctrl+C               Quit

╰─────────────────────────────────────────────────────────╯";

    CommandResult::Message(help_text.into())
}
