use chrono::{DateTime, Local, Utc};
use newschat_core::{ConversationState, Message, Phase, Sender, Source};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

use crate::theme::Theme;

pub const TITLE: &str = "News Chatbot";
pub const SUBTITLE: &str = "Ask me anything about recent news";
pub const WELCOME_TITLE: &str = "Welcome to News Chatbot!";
pub const WELCOME_TEXT: &str =
    "I can help you with information about recent news. Ask me anything!";
pub const INPUT_PLACEHOLDER: &str = "Ask me about recent news...";
pub const LOADING_TEXT: &str = "Searching recent news...";
pub const STREAMING_CURSOR: &str = "▍";

const USER_PREFIX: &str = "You > ";
const BOT_PREFIX: &str = "News > ";

/// `1. Title - https://... (2024-05-01)`
pub fn format_source(index: usize, source: &Source) -> String {
    let mut line = format!("{}. {}", index + 1, source.title);
    if let Some(url) = &source.url {
        line.push_str(" - ");
        line.push_str(url);
    }
    if let Some(date) = &source.date {
        line.push_str(&format!(" ({date})"));
    }
    line
}

pub fn format_time(timestamp: &DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M").to_string()
}

pub fn short_session_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

pub fn status_label(conversation: &ConversationState) -> &'static str {
    match conversation.phase {
        Phase::Idle => "Starting...",
        Phase::AwaitingHistory => "Loading history...",
        Phase::Sending => "Sending...",
        Phase::Ready if conversation.error.is_some() => "Error",
        Phase::Ready => "Ready",
    }
}

pub fn render_message_lines<'a>(msg: &'a Message, theme: &Theme) -> Vec<Line<'a>> {
    let mut lines: Vec<Line> = Vec::new();

    let (prefix, color) = match msg.sender {
        Sender::User => (USER_PREFIX, theme.user_color),
        Sender::Bot if msg.is_error => (BOT_PREFIX, theme.error),
        Sender::Bot => (BOT_PREFIX, theme.bot_color),
    };
    let indent = " ".repeat(prefix.len());

    let mut content: Vec<&str> = msg.content.lines().collect();
    if content.is_empty() {
        content.push("");
    }

    let last = content.len() - 1;
    for (i, raw_line) in content.into_iter().enumerate() {
        let mut spans = if i == 0 {
            vec![Span::styled(
                prefix,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )]
        } else {
            vec![Span::raw(indent.clone())]
        };
        spans.push(Span::styled(raw_line, Style::default().fg(color)));

        if i == last && msg.is_streaming {
            spans.push(Span::styled(
                STREAMING_CURSOR,
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::SLOW_BLINK),
            ));
        }
        if i == last {
            spans.push(Span::styled(
                format!("  {}", format_time(&msg.timestamp)),
                Style::default().fg(theme.muted),
            ));
        }
        lines.push(Line::from(spans));
    }

    if let Some(sources) = msg.sources.as_ref().filter(|s| !s.is_empty()) {
        lines.push(Line::from(vec![
            Span::raw(indent.clone()),
            Span::styled(
                "Sources:",
                Style::default()
                    .fg(theme.source_color)
                    .add_modifier(Modifier::BOLD),
            ),
        ]));
        for (index, source) in sources.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::raw(format!("{indent}  ")),
                Span::styled(
                    format_source(index, source),
                    Style::default().fg(theme.source_color),
                ),
            ]));
        }
    }

    lines
}

/// Every line of the chat window: welcome text or messages, then the
/// loading indicator, the current error and any local notice.
pub fn build_chat_lines<'a>(
    conversation: &'a ConversationState,
    notice: Option<&'a str>,
    theme: &Theme,
) -> Vec<Line<'a>> {
    let mut chat_lines: Vec<Line> = Vec::new();

    if conversation.messages.is_empty() && !conversation.is_loading() {
        chat_lines.push(Line::from(Span::styled(
            WELCOME_TITLE,
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )));
        chat_lines.push(Line::from(Span::styled(
            WELCOME_TEXT,
            Style::default().fg(theme.muted),
        )));
        chat_lines.push(Line::raw(""));
    }

    for msg in &conversation.messages {
        chat_lines.extend(render_message_lines(msg, theme));
        chat_lines.push(Line::raw(""));
    }

    // The streaming cursor already shows progress once text arrives.
    let streaming_text = conversation
        .last_message()
        .map(|m| m.is_streaming && !m.content.is_empty())
        .unwrap_or(false);
    if conversation.is_loading() && !streaming_text {
        chat_lines.push(Line::from(Span::styled(
            format!("  {LOADING_TEXT}"),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::DIM),
        )));
    }

    if let Some(error) = &conversation.error {
        chat_lines.push(Line::from(vec![
            Span::styled(
                "  ! ",
                Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
            ),
            Span::styled(error.as_str(), Style::default().fg(theme.error)),
        ]));
    }

    if let Some(notice) = notice {
        for line in notice.lines() {
            chat_lines.push(Line::from(Span::styled(
                line,
                Style::default().fg(theme.system_color),
            )));
        }
    }

    chat_lines
}
