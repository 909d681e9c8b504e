use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::conversation::DeliveryMode;
use crate::error::{ChatError, Result};
use crate::session::{FileSessionStore, MemorySessionStore, SessionStore};
use crate::transport::{HttpChatClient, DEFAULT_BASE_URL};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Settings {
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub ui: UiSettings,
    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendSettings {
    pub base_url: String,
    /// Use the event-stream endpoint for replies.
    #[serde(default)]
    pub streaming: bool,
    /// Upper bound on a single request. Unset means no client-side limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UiSettings {
    pub theme: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SessionSettings {
    /// Directory for the per-origin session files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            streaming: false,
            request_timeout_secs: None,
        }
    }
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("newschat")
            .join("config.toml")
    }

    /// Load from the default location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Unreadable config, using defaults");
                }
            }
        }
        Self::default()
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| ChatError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn delivery_mode(&self) -> DeliveryMode {
        if self.backend.streaming {
            DeliveryMode::Streaming
        } else {
            DeliveryMode::Buffered
        }
    }

    /// Build the HTTP backend client from the current settings.
    pub fn build_client(&self) -> Result<HttpChatClient> {
        let client = HttpChatClient::new(self.backend.base_url.clone());
        match self.backend.request_timeout_secs {
            Some(secs) if secs > 0 => client.with_timeout(Duration::from_secs(secs)),
            _ => Ok(client),
        }
    }

    /// Session store for the configured backend's origin. Falls back to an
    /// in-memory store when no data directory is available.
    pub fn build_session_store(&self, client: &HttpChatClient) -> Box<dyn SessionStore> {
        let origin = client.origin();
        let store = match &self.session.dir {
            Some(dir) => Ok(FileSessionStore::in_dir(dir, &origin)),
            None => FileSessionStore::for_origin(&origin),
        };
        match store {
            Ok(store) => Box::new(store),
            Err(e) => {
                tracing::warn!(error = %e, "Session storage unavailable, session will not survive restart");
                Box::new(MemorySessionStore::new())
            }
        }
    }
}
