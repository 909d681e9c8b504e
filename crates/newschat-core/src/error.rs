use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    /// The backend answered with a non-success status.
    #[error("HTTP error! status: {status}")]
    Network { status: u16 },

    /// An event line on the reply stream was not valid JSON.
    #[error("Error parsing streaming data: {0}")]
    StreamDecode(String),

    #[error("Session storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChatError {
    pub fn network(status: u16) -> Self {
        Self::Network { status }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageUnavailable(message.into())
    }

    /// Status code carried by a `Network` error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Network { status } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
