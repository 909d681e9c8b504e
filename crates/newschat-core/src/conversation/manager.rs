use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;

use super::message::{Message, Source};
use super::state::{ChatEvent, ChatEventKind, ConversationState, Phase};
use crate::session::{generate_session_id, resolve_session_id, SessionStore};
use crate::transport::{ChatBackend, StreamEvent};

pub const HISTORY_ERROR: &str = "Failed to load chat history";
pub const SEND_ERROR: &str = "Failed to get response. Please try again.";
pub const RESET_ERROR: &str = "Failed to reset chat";
pub const APOLOGY: &str =
    "Sorry, I encountered an error processing your request. Please try again.";

/// How bot replies are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// One request, one complete reply.
    #[default]
    Buffered,
    /// Reply text arrives incrementally over the event stream.
    Streaming,
}

impl DeliveryMode {
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryMode::Buffered => "buffered",
            DeliveryMode::Streaming => "streaming",
        }
    }
}

/// Owns the conversation state and drives every transition.
pub struct ConversationManager {
    state: ConversationState,
    backend: Arc<dyn ChatBackend>,
    store: Box<dyn SessionStore>,
    mode: DeliveryMode,
    events: Option<mpsc::UnboundedSender<ChatEvent>>,
}

impl ConversationManager {
    pub fn new(backend: Arc<dyn ChatBackend>, store: Box<dyn SessionStore>) -> Self {
        Self {
            state: ConversationState::new(),
            backend,
            store,
            mode: DeliveryMode::default(),
            events: None,
        }
    }

    pub fn with_mode(mut self, mode: DeliveryMode) -> Self {
        self.mode = mode;
        self
    }

    /// Forward every applied event to `tx` so an observer can mirror the state.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<ChatEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn session_id(&self) -> Option<&str> {
        self.state.session_id.as_deref()
    }

    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    pub fn set_delivery_mode(&mut self, mode: DeliveryMode) {
        self.mode = mode;
    }

    fn emit(&mut self, session_id: &str, kind: ChatEventKind) {
        let event = ChatEvent::new(session_id, kind);
        self.state.apply(&event);
        if let Some(tx) = &self.events {
            // Observer gone is not an error for the conversation itself.
            let _ = tx.send(event);
        }
    }

    /// Resolve the session id and load its history.
    pub async fn start(&mut self) {
        let session_id = resolve_session_id(self.store.as_ref());
        tracing::info!(session_id = %session_id, "Starting conversation");

        self.emit(&session_id, ChatEventKind::SessionStarted);
        self.emit(&session_id, ChatEventKind::PhaseChanged(Phase::AwaitingHistory));

        match self.backend.get_history(&session_id).await {
            Ok(history) => {
                tracing::debug!(count = history.len(), "Loaded chat history");
                self.emit(&session_id, ChatEventKind::HistoryLoaded(history));
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load chat history");
                self.emit(
                    &session_id,
                    ChatEventKind::ErrorChanged(Some(HISTORY_ERROR.to_string())),
                );
            }
        }

        self.emit(&session_id, ChatEventKind::PhaseChanged(Phase::Ready));
    }

    /// Send `text` and record the reply. Returns false, leaving the state
    /// untouched, for blank text, before a session exists, or while a send
    /// is already in flight.
    pub async fn submit(&mut self, text: &str) -> bool {
        if text.trim().is_empty() || self.state.is_loading() {
            return false;
        }
        let Some(session_id) = self.state.session_id.clone() else {
            return false;
        };

        let user_id = self.state.next_message_id();
        self.emit(
            &session_id,
            ChatEventKind::MessageAppended(Message::user(user_id, text)),
        );
        self.emit(&session_id, ChatEventKind::PhaseChanged(Phase::Sending));
        self.emit(&session_id, ChatEventKind::ErrorChanged(None));

        match self.mode {
            DeliveryMode::Buffered => self.send_buffered(&session_id, text).await,
            DeliveryMode::Streaming => self.send_streaming(&session_id, text).await,
        }

        self.emit(&session_id, ChatEventKind::PhaseChanged(Phase::Ready));
        true
    }

    async fn send_buffered(&mut self, session_id: &str, text: &str) {
        match self.backend.send_message(session_id, text).await {
            Ok(reply) => {
                let id = self.state.next_message_id();
                let message = Message::bot(id, reply.message).with_sources(reply.sources);
                self.emit(session_id, ChatEventKind::MessageAppended(message));
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to send message");
                self.append_failure(session_id);
            }
        }
    }

    async fn send_streaming(&mut self, session_id: &str, text: &str) {
        let bot_id = self.state.next_message_id();
        self.emit(
            session_id,
            ChatEventKind::MessageAppended(Message::bot(bot_id.clone(), "").streaming()),
        );

        let mut events = match self.backend.stream_message(session_id, text).await {
            Ok(events) => events,
            Err(e) => {
                tracing::error!(error = %e, "Failed to open reply stream");
                self.fail_streaming(session_id, &bot_id);
                return;
            }
        };

        let mut sources: Option<Vec<Source>> = None;
        while let Some(event) = events.next().await {
            match event {
                Ok(StreamEvent::Chunk { content }) => self.emit(
                    session_id,
                    ChatEventKind::ContentAppended {
                        id: bot_id.clone(),
                        chunk: content,
                    },
                ),
                Ok(StreamEvent::Complete { sources: done }) => {
                    sources = done;
                    break;
                }
                Ok(StreamEvent::Unknown) => {}
                Err(e) => {
                    tracing::error!(error = %e, "Reply stream failed");
                    drop(events);
                    self.fail_streaming(session_id, &bot_id);
                    return;
                }
            }
        }
        drop(events);

        self.emit(
            session_id,
            ChatEventKind::StreamFinished {
                id: bot_id,
                sources,
            },
        );
    }

    /// Turn the streaming placeholder into the failure message, or keep its
    /// partial text and add a separate failure message after it.
    fn fail_streaming(&mut self, session_id: &str, bot_id: &str) {
        let partial = self
            .state
            .message(bot_id)
            .map(|m| !m.content.is_empty())
            .unwrap_or(false);

        if partial {
            self.emit(
                session_id,
                ChatEventKind::StreamFinished {
                    id: bot_id.to_string(),
                    sources: None,
                },
            );
            self.append_failure(session_id);
        } else {
            self.emit(
                session_id,
                ChatEventKind::MessageFailed {
                    id: bot_id.to_string(),
                    content: APOLOGY.to_string(),
                },
            );
            self.emit(
                session_id,
                ChatEventKind::ErrorChanged(Some(SEND_ERROR.to_string())),
            );
        }
    }

    fn append_failure(&mut self, session_id: &str) {
        let id = self.state.next_message_id();
        self.emit(
            session_id,
            ChatEventKind::MessageAppended(Message::bot(id, APOLOGY).error()),
        );
        self.emit(
            session_id,
            ChatEventKind::ErrorChanged(Some(SEND_ERROR.to_string())),
        );
    }

    /// Settle the state after the caller dropped an in-flight `submit`.
    pub fn abandon_in_flight(&mut self) {
        if !self.state.is_loading() {
            return;
        }
        let Some(session_id) = self.state.session_id.clone() else {
            return;
        };

        let streaming: Vec<String> = self
            .state
            .messages
            .iter()
            .filter(|m| m.is_streaming)
            .map(|m| m.id.clone())
            .collect();
        for id in streaming {
            self.emit(
                &session_id,
                ChatEventKind::StreamFinished { id, sources: None },
            );
        }

        tracing::info!(session_id = %session_id, "Abandoned in-flight request");
        self.emit(&session_id, ChatEventKind::PhaseChanged(Phase::Ready));
    }

    /// Clear the conversation on the backend, then locally, and move to a
    /// fresh session id. On backend failure only `error` changes.
    pub async fn reset(&mut self) -> bool {
        let Some(old_id) = self.state.session_id.clone() else {
            return false;
        };

        if let Err(e) = self.backend.clear_session(&old_id).await {
            tracing::error!(error = %e, session_id = %old_id, "Failed to reset chat");
            self.emit(
                &old_id,
                ChatEventKind::ErrorChanged(Some(RESET_ERROR.to_string())),
            );
            return false;
        }

        let new_id = generate_session_id();
        if let Err(e) = self.store.store(&new_id) {
            tracing::warn!(error = %e, "Could not persist new session id, keeping it in memory only");
            // The stored id now names a conversation the backend has cleared.
            if let Err(e) = self.store.clear() {
                tracing::warn!(error = %e, "Could not clear stale session id");
            }
        }
        tracing::info!(old = %old_id, new = %new_id, "Rotated session");
        self.emit(
            &old_id,
            ChatEventKind::SessionRotated {
                new_session_id: new_id,
            },
        );
        true
    }
}
