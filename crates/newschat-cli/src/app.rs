use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use newschat_core::{
    ChatEvent, ChatEventKind, ConversationManager, ConversationState, DeliveryMode, Sender,
    Settings,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Terminal,
};
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::commands::{self, CommandResult};
use crate::render;
use crate::theme::Theme;

const RESET_WHILE_LOADING: &str = "Wait for the current reply before resetting the chat.";
const MAX_INPUT_LINES: usize = 5;

// ── Single-prompt mode ──────────────────────────────────────────────────

pub async fn run_single_prompt(settings: &Settings, prompt: &str, reset: bool) -> Result<()> {
    let client = Arc::new(settings.build_client()?);
    let store = settings.build_session_store(&client);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ChatEvent>();
    let mut manager = ConversationManager::new(client, store)
        .with_mode(settings.delivery_mode())
        .with_events(event_tx);

    let worker = tokio::spawn({
        let prompt = prompt.trim().to_string();
        async move {
            manager.start().await;
            if reset && !manager.reset().await {
                let error = manager.state().error.clone().unwrap_or_default();
                anyhow::bail!(error);
            }
            if !manager.submit(&prompt).await {
                anyhow::bail!("Nothing to send: the prompt is empty");
            }
            Ok(manager.state().clone())
        }
    });

    let mut stdout = io::stdout();
    while let Some(event) = event_rx.recv().await {
        match event.kind {
            ChatEventKind::ContentAppended { chunk, .. } => {
                print!("{chunk}");
                let _ = stdout.flush();
            }
            ChatEventKind::MessageAppended(message)
                if message.sender == Sender::Bot && !message.is_error =>
            {
                print!("{}", message.content);
            }
            _ => {}
        }
    }

    let state = worker.await??;
    println!();

    if let Some(sources) = state
        .last_message()
        .and_then(|m| m.sources.as_ref())
        .filter(|s| !s.is_empty())
    {
        println!("\nSources:");
        for (index, source) in sources.iter().enumerate() {
            println!("  {}", render::format_source(index, source));
        }
    }

    if let Some(error) = state.error {
        anyhow::bail!(error);
    }
    Ok(())
}

// ── Conversation worker ─────────────────────────────────────────────────

/// Requests from the UI to the task that owns the conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    Submit(String),
    Reset,
    SetStreaming(bool),
    Quit,
}

pub fn spawn_worker(
    manager: ConversationManager,
    commands: mpsc::UnboundedReceiver<ChatCommand>,
) -> JoinHandle<()> {
    tokio::spawn(run_worker(manager, commands))
}

/// Start the conversation, then serve commands until `Quit` or the
/// channel closes. While a submit is in flight further submits are
/// dropped; `Reset` and `Quit` cancel the request first.
pub async fn run_worker(
    mut manager: ConversationManager,
    mut commands: mpsc::UnboundedReceiver<ChatCommand>,
) {
    manager.start().await;

    let mut next: Option<ChatCommand> = None;
    loop {
        let command = match next.take() {
            Some(command) => command,
            None => match commands.recv().await {
                Some(command) => command,
                None => break,
            },
        };

        match command {
            ChatCommand::Submit(text) => {
                let mut deferred_mode: Option<bool> = None;
                let interrupted = {
                    let submit = manager.submit(&text);
                    tokio::pin!(submit);
                    loop {
                        tokio::select! {
                            _ = &mut submit => break None,
                            command = commands.recv() => match command {
                                Some(ChatCommand::Submit(_)) => {
                                    tracing::debug!("Ignoring submit while a reply is pending");
                                }
                                Some(ChatCommand::SetStreaming(on)) => deferred_mode = Some(on),
                                Some(other) => break Some(other),
                                None => break Some(ChatCommand::Quit),
                            },
                        }
                    }
                };

                if let Some(command) = interrupted {
                    manager.abandon_in_flight();
                    next = Some(command);
                }
                if let Some(on) = deferred_mode {
                    manager.set_delivery_mode(delivery_mode(on));
                }
            }
            ChatCommand::Reset => {
                manager.reset().await;
            }
            ChatCommand::SetStreaming(on) => manager.set_delivery_mode(delivery_mode(on)),
            ChatCommand::Quit => break,
        }
    }

    tracing::debug!("Conversation worker stopped");
}

fn delivery_mode(streaming: bool) -> DeliveryMode {
    if streaming {
        DeliveryMode::Streaming
    } else {
        DeliveryMode::Buffered
    }
}

// ── Interactive TUI ─────────────────────────────────────────────────────

pub struct AppState {
    /// Mirror of the worker's conversation, rebuilt from its events.
    pub conversation: ConversationState,

    pub input: String,
    /// Byte offset into `input`, always on a char boundary.
    pub cursor_pos: usize,

    pub scroll_offset: usize,

    /// Output of the last slash command, shown under the chat.
    pub notice: Option<String>,

    pub backend_url: String,
    pub mode: DeliveryMode,
    pub theme: Theme,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(backend_url: impl Into<String>, mode: DeliveryMode, theme_name: &str) -> Self {
        Self {
            conversation: ConversationState::new(),
            input: String::new(),
            cursor_pos: 0,
            scroll_offset: 0,
            notice: None,
            backend_url: backend_url.into(),
            mode,
            theme: Theme::by_name(theme_name),
            should_quit: false,
        }
    }

    pub fn apply_event(&mut self, event: &ChatEvent) {
        if !self.conversation.apply(event) {
            return;
        }
        if let ChatEventKind::SessionRotated { .. } = event.kind {
            self.notice = Some("Started a new conversation.".into());
        }
        self.scroll_to_bottom();
    }

    fn scroll_to_bottom(&mut self) {
        // Resolved on next draw
        self.scroll_offset = usize::MAX;
    }

    /// Height of the input box: one row per input line plus borders.
    pub fn input_height(&self) -> u16 {
        let lines = self.input.split('\n').count().clamp(1, MAX_INPUT_LINES);
        lines as u16 + 2
    }

    /// Cursor as (row, column) in chars within the input box.
    pub fn cursor_row_col(&self) -> (usize, usize) {
        let before = &self.input[..self.cursor_pos];
        let row = before.matches('\n').count();
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        (row, before[line_start..].chars().count())
    }

    fn take_input(&mut self) -> String {
        self.cursor_pos = 0;
        std::mem::take(&mut self.input)
    }
}

pub async fn run_tui(settings: Settings, theme_name: &str, reset: bool) -> Result<()> {
    let client = Arc::new(settings.build_client()?);
    let store = settings.build_session_store(&client);
    let mode = settings.delivery_mode();
    let mut state = AppState::new(client.base_url(), mode, theme_name);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ChatEvent>();
    let (command_tx, command_rx) = mpsc::unbounded_channel::<ChatCommand>();

    let manager = ConversationManager::new(client, store)
        .with_mode(mode)
        .with_events(event_tx);
    if reset {
        let _ = command_tx.send(ChatCommand::Reset);
    }
    let worker = spawn_worker(manager, command_rx);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_event_loop(&mut terminal, &mut state, &mut event_rx, &command_tx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    let _ = command_tx.send(ChatCommand::Quit);
    drop(command_tx);
    if tokio::time::timeout(Duration::from_secs(2), worker)
        .await
        .is_err()
    {
        tracing::warn!("Conversation worker did not stop in time");
    }

    result
}

fn run_event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    state: &mut AppState,
    event_rx: &mut mpsc::UnboundedReceiver<ChatEvent>,
    command_tx: &mpsc::UnboundedSender<ChatCommand>,
) -> Result<()> {
    loop {
        terminal.draw(|f| draw_ui(f, state))?;

        // Conversation events (non-blocking)
        while let Ok(event) = event_rx.try_recv() {
            state.apply_event(&event);
        }

        if event::poll(Duration::from_millis(33))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(state, key, command_tx);
                }
            }
        }

        if state.should_quit {
            return Ok(());
        }
    }
}

fn draw_ui(f: &mut ratatui::Frame, state: &mut AppState) {
    let theme = state.theme.clone();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),                   // header
            Constraint::Min(5),                      // chat
            Constraint::Length(state.input_height()), // input
            Constraint::Length(1), // status
        ])
        .split(f.area());

    draw_header(f, main_chunks[0], &theme);

    let chat_area = main_chunks[1];
    let chat_lines =
        render::build_chat_lines(&state.conversation, state.notice.as_deref(), &theme);
    let total_lines = chat_lines.len();

    // Visible height (area height - 2 for borders)
    let visible_height = chat_area.height.saturating_sub(2) as usize;
    let max_scroll = total_lines.saturating_sub(visible_height);
    let scroll = state.scroll_offset.min(max_scroll);

    let chat = Paragraph::new(Text::from(chat_lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Chat ")
                .border_style(Style::default().fg(theme.border)),
        )
        .wrap(Wrap { trim: false })
        .scroll((scroll as u16, 0));
    f.render_widget(chat, chat_area);

    if total_lines > visible_height {
        let mut scrollbar_state = ScrollbarState::new(max_scroll).position(scroll);
        f.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("^"))
                .end_symbol(Some("v")),
            chat_area,
            &mut scrollbar_state,
        );
    }

    state.scroll_offset = scroll;

    draw_input(f, main_chunks[2], state, &theme);
    draw_status_bar(f, main_chunks[3], state, &theme);
}

fn draw_header(f: &mut ratatui::Frame, area: Rect, theme: &Theme) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {} ", render::TITLE),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(render::SUBTITLE, Style::default().fg(theme.muted)),
        Span::styled("   Ctrl+R reset", Style::default().fg(theme.muted)),
    ]));
    f.render_widget(header, area);
}

fn draw_input(f: &mut ratatui::Frame, area: Rect, state: &AppState, theme: &Theme) {
    let loading = state.conversation.is_loading();

    let title = if loading {
        " Waiting for reply... "
    } else if state.input.starts_with('/') {
        " Command "
    } else {
        " Message  Enter to send, Shift+Enter for newline "
    };

    let text = if state.input.is_empty() {
        Text::from(Span::styled(
            render::INPUT_PLACEHOLDER,
            Style::default().fg(theme.muted),
        ))
    } else {
        let style = Style::default().fg(if loading { theme.muted } else { theme.fg });
        Text::from(
            state
                .input
                .split('\n')
                .map(|line| Line::from(Span::styled(line, style)))
                .collect::<Vec<_>>(),
        )
    };

    // Keep the cursor row in view once the input outgrows the box.
    let (row, column) = state.cursor_row_col();
    let inner_rows = area.height.saturating_sub(2).max(1) as usize;
    let first_row = (row + 1).saturating_sub(inner_rows);

    let input = Paragraph::new(text).scroll((first_row as u16, 0)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(if state.input.starts_with('/') {
                theme.accent
            } else {
                theme.border
            })),
    );
    f.render_widget(input, area);

    if !loading {
        let cursor_x = area.x + column as u16 + 1;
        let cursor_y = area.y + (row - first_row) as u16 + 1;
        let max_x = area.x + area.width.saturating_sub(2);
        f.set_cursor_position((cursor_x.min(max_x), cursor_y));
    }
}

fn draw_status_bar(f: &mut ratatui::Frame, area: Rect, state: &AppState, theme: &Theme) {
    let session = state
        .conversation
        .session_id
        .as_deref()
        .map(render::short_session_id)
        .unwrap_or("-");

    let status_style = if state.conversation.error.is_some() {
        Style::default().fg(theme.warning)
    } else {
        Style::default().fg(theme.muted)
    };

    let status_spans = vec![
        Span::styled(
            format!(" {} ", state.backend_url),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("| session {session} "),
            Style::default().fg(theme.accent),
        ),
        Span::styled(
            format!("| {} ", state.mode.label()),
            Style::default().fg(theme.muted),
        ),
        Span::styled("| ", Style::default().fg(theme.muted)),
        Span::styled(render::status_label(&state.conversation), status_style),
    ];
    f.render_widget(Paragraph::new(Line::from(status_spans)), area);
}

pub fn handle_key(
    state: &mut AppState,
    key: KeyEvent,
    command_tx: &mpsc::UnboundedSender<ChatCommand>,
) {
    let loading = state.conversation.is_loading();

    match (key.modifiers, key.code) {
        // Quit
        (KeyModifiers::CONTROL, KeyCode::Char('c')) | (_, KeyCode::Esc) => {
            request_quit(state, command_tx);
        }

        (KeyModifiers::CONTROL, KeyCode::Char('r')) => request_reset(state, command_tx),

        // Newline (Alt+Enter where the terminal does not report Shift)
        (modifiers, KeyCode::Enter)
            if modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
        {
            if !loading {
                state.input.insert(state.cursor_pos, '\n');
                state.cursor_pos += 1;
            }
        }

        (_, KeyCode::Enter) => {
            if loading || state.input.trim().is_empty() {
                return;
            }

            let input = state.take_input();
            let text = input.trim();

            if text.starts_with('/') {
                handle_command_result(state, commands::handle_command(text), command_tx);
                return;
            }

            state.notice = None;
            let _ = command_tx.send(ChatCommand::Submit(text.to_string()));
        }

        // Input editing
        (_, KeyCode::Backspace) => {
            if state.cursor_pos > 0 && !loading {
                let prev = prev_boundary(&state.input, state.cursor_pos);
                state.input.drain(prev..state.cursor_pos);
                state.cursor_pos = prev;
            }
        }
        (_, KeyCode::Delete) => {
            if state.cursor_pos < state.input.len() && !loading {
                let next = next_boundary(&state.input, state.cursor_pos);
                state.input.drain(state.cursor_pos..next);
            }
        }
        (_, KeyCode::Left) => {
            state.cursor_pos = prev_boundary(&state.input, state.cursor_pos);
        }
        (_, KeyCode::Right) => {
            state.cursor_pos = next_boundary(&state.input, state.cursor_pos);
        }
        (_, KeyCode::Home) => {
            state.cursor_pos = 0;
        }
        (_, KeyCode::End) => {
            state.cursor_pos = state.input.len();
        }

        // Scroll
        (_, KeyCode::Up) => {
            state.scroll_offset = state.scroll_offset.saturating_sub(1);
        }
        (_, KeyCode::Down) => {
            state.scroll_offset = state.scroll_offset.saturating_add(1);
        }
        (_, KeyCode::PageUp) => {
            state.scroll_offset = state.scroll_offset.saturating_sub(10);
        }
        (_, KeyCode::PageDown) => {
            state.scroll_offset = state.scroll_offset.saturating_add(10);
        }

        // Regular character input
        (modifiers, KeyCode::Char(c))
            if !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            if !loading {
                state.input.insert(state.cursor_pos, c);
                state.cursor_pos += c.len_utf8();
            }
        }

        _ => {}
    }
}

pub fn handle_command_result(
    state: &mut AppState,
    result: CommandResult,
    command_tx: &mpsc::UnboundedSender<ChatCommand>,
) {
    match result {
        CommandResult::Message(msg) => {
            state.notice = Some(msg);
        }
        CommandResult::Reset => request_reset(state, command_tx),
        CommandResult::Quit => request_quit(state, command_tx),
        CommandResult::ShowSession => {
            let session = state
                .conversation
                .session_id
                .as_deref()
                .unwrap_or("(none yet)");
            state.notice = Some(format!(
                "Session: {session}\nBackend: {}\nReplies: {}",
                state.backend_url,
                state.mode.label()
            ));
        }
        CommandResult::SetStreaming(on) => {
            let on = on.unwrap_or(state.mode != DeliveryMode::Streaming);
            state.mode = delivery_mode(on);
            let _ = command_tx.send(ChatCommand::SetStreaming(on));
            state.notice = Some(format!("Replies are now {}.", state.mode.label()));
        }
        CommandResult::ThemeChanged(name) => {
            state.theme = Theme::by_name(&name);
            state.notice = Some(format!("Theme changed to: {}", state.theme.name));
        }
        CommandResult::NotACommand => {}
    }
    state.scroll_to_bottom();
}

fn request_reset(state: &mut AppState, command_tx: &mpsc::UnboundedSender<ChatCommand>) {
    if state.conversation.is_loading() {
        state.notice = Some(RESET_WHILE_LOADING.into());
        return;
    }
    state.notice = None;
    let _ = command_tx.send(ChatCommand::Reset);
}

fn request_quit(state: &mut AppState, command_tx: &mpsc::UnboundedSender<ChatCommand>) {
    let _ = command_tx.send(ChatCommand::Quit);
    state.should_quit = true;
}

fn prev_boundary(s: &str, pos: usize) -> usize {
    s[..pos]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn next_boundary(s: &str, pos: usize) -> usize {
    s[pos..]
        .chars()
        .next()
        .map(|c| pos + c.len_utf8())
        .unwrap_or(pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_step_over_multibyte_chars() {
        let s = "aé€";
        assert_eq!(next_boundary(s, 0), 1);
        assert_eq!(next_boundary(s, 1), 3);
        assert_eq!(next_boundary(s, 3), 6);
        assert_eq!(next_boundary(s, 6), 6);
        assert_eq!(prev_boundary(s, 6), 3);
        assert_eq!(prev_boundary(s, 3), 1);
        assert_eq!(prev_boundary(s, 0), 0);
    }
}
