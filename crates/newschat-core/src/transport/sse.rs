//! Incremental decoder for the reply event stream.
//!
//! The body is a sequence of `data: <json>` lines. Bytes are buffered until a
//! full line is available, so a line (or a multi-byte UTF-8 character) split
//! across two network reads is decoded once, intact.

use std::collections::VecDeque;
use std::pin::Pin;

use futures::stream::{self, Stream, StreamExt};

use super::{EventStream, StreamEvent};
use crate::error::ChatError;

pub const DATA_PREFIX: &str = "data: ";
pub const DONE_MARKER: &str = "[DONE]";

/// A decoded line of the event stream.
#[derive(Debug, Clone, PartialEq)]
pub enum SseFrame {
    Event(StreamEvent),
    /// The literal `[DONE]` terminator.
    Done,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network read; returns the frames completed by it, in order.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(bytes);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(frame) = decode_line(&line[..line.len() - 1]) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Decode whatever is left once the body has ended without a final newline.
    pub fn finish(&mut self) -> Vec<SseFrame> {
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&rest).into_iter().collect()
    }

    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }
}

fn decode_line(raw: &[u8]) -> Option<SseFrame> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    let line = match std::str::from_utf8(raw) {
        Ok(line) => line,
        Err(e) => {
            tracing::warn!(error = %e, "Skipping non UTF-8 stream line");
            return None;
        }
    };

    let data = line.strip_prefix(DATA_PREFIX)?;
    if data == DONE_MARKER {
        return Some(SseFrame::Done);
    }

    match serde_json::from_str::<StreamEvent>(data) {
        Ok(StreamEvent::Unknown) => {
            tracing::debug!(data = %data, "Ignoring unknown stream event type");
            None
        }
        Ok(event) => Some(SseFrame::Event(event)),
        Err(e) => {
            let err = ChatError::StreamDecode(e.to_string());
            tracing::error!(error = %err, data = %data, "Skipping malformed stream event");
            None
        }
    }
}

struct DecodeState<S> {
    body: Pin<Box<S>>,
    decoder: SseDecoder,
    ready: VecDeque<SseFrame>,
    body_done: bool,
    finished: bool,
}

/// Turn a body of byte chunks into a lazy stream of reply events.
///
/// The returned stream ends after a `Complete` event, at the `[DONE]` marker,
/// after the first transport error, or when the body ends.
pub fn decode_event_stream<S, B, E>(body: S) -> EventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<ChatError> + Send + 'static,
{
    let state = DecodeState {
        body: Box::pin(body),
        decoder: SseDecoder::new(),
        ready: VecDeque::new(),
        body_done: false,
        finished: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if st.finished {
                return None;
            }

            if let Some(frame) = st.ready.pop_front() {
                match frame {
                    SseFrame::Done => return None,
                    SseFrame::Event(event) => {
                        if matches!(event, StreamEvent::Complete { .. }) {
                            st.finished = true;
                        }
                        return Some((Ok(event), st));
                    }
                }
            }

            if st.body_done {
                return None;
            }

            match st.body.next().await {
                Some(Ok(bytes)) => {
                    let frames = st.decoder.push(bytes.as_ref());
                    st.ready.extend(frames);
                }
                Some(Err(e)) => {
                    st.finished = true;
                    return Some((Err(e.into()), st));
                }
                None => {
                    st.body_done = true;
                    let frames = st.decoder.finish();
                    st.ready.extend(frames);
                }
            }
        }
    })
    .boxed()
}
