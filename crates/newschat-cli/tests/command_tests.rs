use newschat_cli::commands::{handle_command, CommandResult};
use newschat_cli::theme::Theme;

// ========================================================================
// Command Parsing Tests (commands.rs)
// ========================================================================

#[test]
fn test_help_command() {
    let result = handle_command("/help");

    if let CommandResult::Message(msg) = result {
        assert!(msg.contains("newschat Commands"));
        assert!(msg.contains("/reset"));
        assert!(msg.contains("/stream"));
    } else {
        panic!("expected help text, got {result:?}");
    }
}

#[test]
fn test_help_command_short_alias() {
    assert_eq!(handle_command("/h"), handle_command("/help"));
}

#[test]
fn test_quit_aliases() {
    for cmd in ["/exit", "/quit", "/q"] {
        assert_eq!(handle_command(cmd), CommandResult::Quit, "{cmd}");
    }
}

#[test]
fn test_reset_aliases() {
    for cmd in ["/reset", "/new", "/clear"] {
        assert_eq!(handle_command(cmd), CommandResult::Reset, "{cmd}");
    }
}

#[test]
fn test_session_command() {
    assert_eq!(handle_command("/session"), CommandResult::ShowSession);
}

#[test]
fn test_stream_command_arguments() {
    assert_eq!(handle_command("/stream"), CommandResult::SetStreaming(None));
    assert_eq!(
        handle_command("/stream on"),
        CommandResult::SetStreaming(Some(true))
    );
    assert_eq!(
        handle_command("/stream  off "),
        CommandResult::SetStreaming(Some(false))
    );
    assert!(matches!(
        handle_command("/stream maybe"),
        CommandResult::Message(msg) if msg.contains("Usage")
    ));
}

#[test]
fn test_theme_command_with_name() {
    assert_eq!(
        handle_command("/theme dracula"),
        CommandResult::ThemeChanged("dracula".into())
    );
}

#[test]
fn test_theme_command_without_name_lists_themes() {
    if let CommandResult::Message(msg) = handle_command("/theme") {
        for name in Theme::all_names() {
            assert!(msg.contains(name), "missing {name}");
        }
    } else {
        panic!("expected theme list");
    }
}

#[test]
fn test_version_command() {
    if let CommandResult::Message(msg) = handle_command("/version") {
        assert!(msg.starts_with("newschat v"));
        assert!(msg.contains(env!("CARGO_PKG_VERSION")));
    } else {
        panic!("expected version text");
    }
}

#[test]
fn test_unknown_command() {
    if let CommandResult::Message(msg) = handle_command("/frobnicate") {
        assert!(msg.contains("Unknown command: /frobnicate"));
    } else {
        panic!("expected unknown command message");
    }
}

#[test]
fn test_plain_text_is_not_a_command() {
    assert_eq!(
        handle_command("what happened today?"),
        CommandResult::NotACommand
    );
    assert_eq!(handle_command(""), CommandResult::NotACommand);
}

// ========================================================================
// Theme Tests (theme.rs)
// ========================================================================

#[test]
fn test_theme_by_name() {
    assert_eq!(Theme::by_name("tokyo-night").name, "tokyo-night");
    assert_eq!(Theme::by_name("dracula").name, "dracula");
    assert_eq!(Theme::by_name("dark").name, "dark");
}

#[test]
fn test_unknown_theme_falls_back_to_dark() {
    assert_eq!(Theme::by_name("neon").name, "dark");
}

#[test]
fn test_every_listed_theme_resolves() {
    for name in Theme::all_names() {
        assert_eq!(Theme::by_name(name).name, *name);
    }
}
