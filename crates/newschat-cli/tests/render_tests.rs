use newschat_cli::render::{self, build_chat_lines, render_message_lines};
use newschat_cli::Theme;
use newschat_core::*;
use ratatui::text::Line;

fn text(line: &Line) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
}

fn all_text(lines: &[Line]) -> Vec<String> {
    lines.iter().map(text).collect()
}

fn state_with(events: Vec<ChatEventKind>) -> ConversationState {
    let mut state = ConversationState::new();
    state.apply(&ChatEvent::new("s1", ChatEventKind::SessionStarted));
    for kind in events {
        state.apply(&ChatEvent::new("s1", kind));
    }
    state
}

#[test]
fn test_empty_conversation_shows_welcome() {
    let theme = Theme::dark();
    let state = state_with(vec![ChatEventKind::PhaseChanged(Phase::Ready)]);

    let lines = all_text(&build_chat_lines(&state, None, &theme));

    assert_eq!(lines[0], render::WELCOME_TITLE);
    assert_eq!(lines[1], render::WELCOME_TEXT);
    assert!(!lines.iter().any(|l| l.contains(render::LOADING_TEXT)));
}

#[test]
fn test_messages_render_with_prefixes_and_sources() {
    let theme = Theme::dark();
    let reply = Message::bot("2", "Rates held.\nMarkets calm.").with_sources(Some(vec![
        Source {
            title: "Fed".into(),
            url: Some("https://fed.example".into()),
            date: Some("2024-05-01".into()),
        },
        Source::titled("Wire"),
    ]));
    let state = state_with(vec![
        ChatEventKind::MessageAppended(Message::user("1", "rates?")),
        ChatEventKind::MessageAppended(reply),
    ]);

    let lines = all_text(&build_chat_lines(&state, None, &theme));

    assert!(lines[0].starts_with("You > rates?"));
    assert!(lines.iter().any(|l| l.starts_with("News > Rates held.")));
    assert!(lines.iter().any(|l| l.starts_with("       Markets calm.")));
    assert!(lines.iter().any(|l| l.trim() == "Sources:"));
    assert!(lines
        .iter()
        .any(|l| l.trim() == "1. Fed - https://fed.example (2024-05-01)"));
    assert!(lines.iter().any(|l| l.trim() == "2. Wire"));
    assert!(!lines.iter().any(|l| l.contains(render::WELCOME_TITLE)));
}

#[test]
fn test_loading_text_shown_until_streamed_text_arrives() {
    let theme = Theme::dark();
    let mut state = state_with(vec![
        ChatEventKind::MessageAppended(Message::user("1", "hi")),
        ChatEventKind::PhaseChanged(Phase::Sending),
        ChatEventKind::MessageAppended(Message::bot("2", "").streaming()),
    ]);

    let lines = all_text(&build_chat_lines(&state, None, &theme));
    assert!(lines.iter().any(|l| l == "  Searching recent news..."));

    state.apply(&ChatEvent::new(
        "s1",
        ChatEventKind::ContentAppended {
            id: "2".into(),
            chunk: "Hel".into(),
        },
    ));
    let lines = all_text(&build_chat_lines(&state, None, &theme));
    assert!(!lines.iter().any(|l| l.contains(render::LOADING_TEXT)));
    assert!(lines
        .iter()
        .any(|l| l.starts_with(&format!("News > Hel{}", render::STREAMING_CURSOR))));
}

#[test]
fn test_error_message_and_error_line_use_error_color() {
    let theme = Theme::dark();
    let failed = Message::bot("2", "Sorry").error();
    let state = state_with(vec![
        ChatEventKind::MessageAppended(failed.clone()),
        ChatEventKind::ErrorChanged(Some("Failed to get response. Please try again.".into())),
    ]);

    let message_lines = render_message_lines(&failed, &theme);
    assert_eq!(message_lines[0].spans[0].style.fg, Some(theme.error));

    let lines = build_chat_lines(&state, None, &theme);
    let last = lines.last().unwrap();
    assert_eq!(text(last), "  ! Failed to get response. Please try again.");
    assert_eq!(last.spans[1].style.fg, Some(theme.error));
}

#[test]
fn test_notice_renders_after_conversation() {
    let theme = Theme::dark();
    let state = state_with(vec![ChatEventKind::PhaseChanged(Phase::Ready)]);

    let lines = all_text(&build_chat_lines(&state, Some("Session: s1\nBackend: x"), &theme));

    let n = lines.len();
    assert_eq!(lines[n - 2], "Session: s1");
    assert_eq!(lines[n - 1], "Backend: x");
}

#[test]
fn test_status_label_follows_phase() {
    let mut state = ConversationState::new();
    assert_eq!(render::status_label(&state), "Starting...");

    state.phase = Phase::Sending;
    assert_eq!(render::status_label(&state), "Sending...");

    state.phase = Phase::Ready;
    assert_eq!(render::status_label(&state), "Ready");

    state.error = Some("Failed to reset chat".into());
    assert_eq!(render::status_label(&state), "Error");
}
