mod http;
pub mod sse;

pub use http::{HttpChatClient, DEFAULT_BASE_URL};
pub use sse::{decode_event_stream, SseDecoder, SseFrame};

use crate::conversation::{Message, Source};
use crate::error::Result;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

/// Reply to a buffered send.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatReply {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Source>>,
}

/// One decoded event of a streamed reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Chunk {
        content: String,
    },
    Complete {
        #[serde(default)]
        sources: Option<Vec<Source>>,
    },
    /// Any event type this client does not know about.
    #[serde(other)]
    Unknown,
}

/// Lazily decoded reply events. Dropping it releases the response body.
pub type EventStream = BoxStream<'static, Result<StreamEvent>>;

/// The chat backend as seen by the conversation manager.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send_message(&self, session_id: &str, text: &str) -> Result<ChatReply>;

    /// Open a streamed reply. Ends after `Complete`, the `[DONE]` marker, or
    /// the end of the body.
    async fn stream_message(&self, session_id: &str, text: &str) -> Result<EventStream>;

    /// Conversation history. A session the backend does not know yields an
    /// empty log rather than an error.
    async fn get_history(&self, session_id: &str) -> Result<Vec<Message>>;

    async fn clear_session(&self, session_id: &str) -> Result<()>;
}

/// Callback form of [`ChatBackend::stream_message`].
pub async fn send_message_streaming<F, G>(
    backend: &dyn ChatBackend,
    session_id: &str,
    text: &str,
    mut on_chunk: F,
    on_complete: G,
) -> Result<()>
where
    F: FnMut(&str),
    G: FnOnce(Option<Vec<Source>>),
{
    let mut events = backend.stream_message(session_id, text).await?;
    while let Some(event) = events.next().await {
        match event? {
            StreamEvent::Chunk { content } => on_chunk(&content),
            StreamEvent::Complete { sources } => {
                on_complete(sources);
                return Ok(());
            }
            StreamEvent::Unknown => {}
        }
    }
    Ok(())
}
