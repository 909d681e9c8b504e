use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::{SessionStore, SESSION_KEY};
use crate::error::{ChatError, Result};

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(rename = "chatbot_session_id", default, skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
}

/// Stores the session id as a small JSON file, one file per backend origin.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store for `origin` under the default directory (`<data_dir>/newschat/sessions`).
    pub fn for_origin(origin: &str) -> Result<Self> {
        let base = Self::default_dir()?;
        Ok(Self::in_dir(base, origin))
    }

    /// Store for `origin` under `dir`. The directory is created on first write.
    pub fn in_dir(dir: impl AsRef<Path>, origin: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", origin_slug(origin))),
        }
    }

    pub fn default_dir() -> Result<PathBuf> {
        let data = dirs::data_dir()
            .ok_or_else(|| ChatError::storage("Could not determine data directory"))?;
        Ok(data.join("newschat").join("sessions"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<SessionFile> {
        if !self.path.exists() {
            return Ok(SessionFile::default());
        }
        let contents = fs::read_to_string(&self.path).map_err(|e| {
            ChatError::storage(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            ChatError::storage(format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }

    fn write(&self, file: &SessionFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ChatError::storage(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        let contents = serde_json::to_string_pretty(file)?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, contents).map_err(|e| {
            ChatError::storage(format!("Failed to write {}: {}", tmp_path.display(), e))
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            ChatError::storage(format!("Failed to rename {}: {}", tmp_path.display(), e))
        })?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.read()?.session_id.filter(|id| !id.is_empty()))
    }

    fn store(&self, session_id: &str) -> Result<()> {
        tracing::debug!(path = %self.path.display(), key = SESSION_KEY, "Storing session id");
        self.write(&SessionFile {
            session_id: Some(session_id.to_string()),
        })
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                ChatError::storage(format!("Failed to remove {}: {}", self.path.display(), e))
            })?;
        }
        Ok(())
    }
}

/// File-name-safe form of a backend origin, e.g. `http_localhost_3001`.
pub(crate) fn origin_slug(origin: &str) -> String {
    let slug: String = origin
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let collapsed = slug
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    if collapsed.is_empty() {
        "default".to_string()
    } else {
        collapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_strips_separators() {
        assert_eq!(origin_slug("http://localhost:3001"), "http_localhost_3001");
        assert_eq!(origin_slug("https://news.example.com"), "https_news_example_com");
        assert_eq!(origin_slug(":://"), "default");
    }
}
