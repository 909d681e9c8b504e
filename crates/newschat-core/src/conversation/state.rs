use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::message::{Message, Source};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing has happened yet
    #[default]
    Idle,
    /// Session resolved, history request in flight
    AwaitingHistory,
    /// A submission is waiting on the backend
    Sending,
    /// Accepting input. An `error` may decorate this phase.
    Ready,
}

/// A single change to the conversation state.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEventKind {
    /// A session id was adopted at startup.
    SessionStarted,
    PhaseChanged(Phase),
    HistoryLoaded(Vec<Message>),
    MessageAppended(Message),
    ContentAppended { id: String, chunk: String },
    StreamFinished { id: String, sources: Option<Vec<Source>> },
    /// An empty streaming placeholder became the error message.
    MessageFailed { id: String, content: String },
    ErrorChanged(Option<String>),
    /// Log and error cleared, the conversation moved to `new_session_id`.
    SessionRotated { new_session_id: String },
}

/// A state change tagged with the session it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEvent {
    pub session_id: String,
    pub kind: ChatEventKind,
}

impl ChatEvent {
    pub fn new(session_id: impl Into<String>, kind: ChatEventKind) -> Self {
        Self {
            session_id: session_id.into(),
            kind,
        }
    }
}

/// The conversation as the user sees it.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    pub session_id: Option<String>,
    pub messages: Vec<Message>,
    pub phase: Phase,
    pub error: Option<String>,
    last_id: i64,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Sending
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Next message id: current epoch milliseconds, bumped past the previous
    /// id when two messages land in the same millisecond.
    pub fn next_message_id(&mut self) -> String {
        let now = Utc::now().timestamp_millis();
        self.last_id = now.max(self.last_id + 1);
        self.last_id.to_string()
    }

    /// Apply an event. Returns false when the event was dropped because it
    /// belongs to a session this state has already left.
    pub fn apply(&mut self, event: &ChatEvent) -> bool {
        if let ChatEventKind::SessionStarted = event.kind {
            self.session_id = Some(event.session_id.clone());
            return true;
        }

        if self.session_id.as_deref() != Some(event.session_id.as_str()) {
            tracing::debug!(
                event_session = %event.session_id,
                current = ?self.session_id,
                "Dropping event for stale session"
            );
            return false;
        }

        match &event.kind {
            ChatEventKind::SessionStarted => {}
            ChatEventKind::PhaseChanged(phase) => self.phase = *phase,
            ChatEventKind::HistoryLoaded(history) => self.messages = history.clone(),
            ChatEventKind::MessageAppended(message) => self.messages.push(message.clone()),
            ChatEventKind::ContentAppended { id, chunk } => {
                if let Some(msg) = self.message_mut(id) {
                    msg.content.push_str(chunk);
                }
            }
            ChatEventKind::StreamFinished { id, sources } => {
                if let Some(msg) = self.message_mut(id) {
                    msg.is_streaming = false;
                    msg.sources = sources.clone();
                }
            }
            ChatEventKind::MessageFailed { id, content } => {
                if let Some(msg) = self.message_mut(id) {
                    msg.is_streaming = false;
                    msg.is_error = true;
                    msg.content.push_str(content);
                }
            }
            ChatEventKind::ErrorChanged(error) => self.error = error.clone(),
            ChatEventKind::SessionRotated { new_session_id } => {
                self.messages.clear();
                self.error = None;
                self.session_id = Some(new_session_id.clone());
            }
        }
        true
    }

    fn message_mut(&mut self, id: &str) -> Option<&mut Message> {
        self.messages.iter_mut().rev().find(|m| m.id == id)
    }
}
