use std::time::{Duration, Instant};

use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::sse::decode_event_stream;
use super::{ChatBackend, ChatReply, EventStream};
use crate::conversation::Message;
use crate::error::{ChatError, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3001/api";

/// HTTP client for the chat backend.
pub struct HttpChatClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    messages: Vec<Message>,
}

impl HttpChatClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Bound every request by `timeout`. Without it requests wait as long as
    /// the connection stays open.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Scheme, host and port of the backend; sessions are stored per origin.
    pub fn origin(&self) -> String {
        match reqwest::Url::parse(&self.base_url) {
            Ok(url) => url.origin().ascii_serialization(),
            Err(_) => self.base_url.clone(),
        }
    }

    fn url(&self, session_id: &str, suffix: &str) -> String {
        format!("{}/chat/{}{}", self.base_url, session_id, suffix)
    }

    async fn send(
        &self,
        method: Method,
        url: String,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response> {
        let start = Instant::now();
        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(%method, %url, error = %e, "Backend request failed");
                return Err(e.into());
            }
        };

        tracing::debug!(
            %method,
            %url,
            status = response.status().as_u16(),
            duration_ms = %start.elapsed().as_millis(),
            "Backend responded"
        );
        Ok(response)
    }
}

fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ChatError::network(status.as_u16()))
    }
}

#[async_trait::async_trait]
impl ChatBackend for HttpChatClient {
    async fn send_message(&self, session_id: &str, text: &str) -> Result<ChatReply> {
        let response = self
            .send(
                Method::POST,
                self.url(session_id, ""),
                Some(json!({ "message": text })),
            )
            .await?;
        let reply = ensure_success(response)?.json::<ChatReply>().await?;
        Ok(reply)
    }

    async fn stream_message(&self, session_id: &str, text: &str) -> Result<EventStream> {
        let response = self
            .send(
                Method::POST,
                self.url(session_id, "/stream"),
                Some(json!({ "message": text })),
            )
            .await?;
        let response = ensure_success(response)?;
        Ok(decode_event_stream(response.bytes_stream()))
    }

    async fn get_history(&self, session_id: &str) -> Result<Vec<Message>> {
        let response = self
            .send(Method::GET, self.url(session_id, "/history"), None)
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(session_id = %session_id, "No history on backend");
            return Ok(Vec::new());
        }

        let history = ensure_success(response)?.json::<HistoryResponse>().await?;
        Ok(history.messages)
    }

    async fn clear_session(&self, session_id: &str) -> Result<()> {
        let response = self
            .send(Method::DELETE, self.url(session_id, ""), None)
            .await?;
        ensure_success(response)?;
        Ok(())
    }
}
