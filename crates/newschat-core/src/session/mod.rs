//! Persistence of the client-generated conversation identifier.

mod file;

pub use file::FileSessionStore;

use crate::error::{ChatError, Result};
use std::sync::{Arc, Mutex};

/// Key under which the session id is stored.
pub const SESSION_KEY: &str = "chatbot_session_id";

/// Durable storage for one session identifier.
pub trait SessionStore: Send + Sync {
    /// The previously stored identifier, if any.
    fn load(&self) -> Result<Option<String>>;

    fn store(&self, session_id: &str) -> Result<()>;

    fn clear(&self) -> Result<()>;
}

/// A fresh, globally unique session identifier.
pub fn generate_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Return the stored session id, generating and storing one when absent.
///
/// Storage failures never fail the caller: the id is then only kept in
/// memory for the lifetime of the process.
pub fn resolve_session_id(store: &dyn SessionStore) -> String {
    match store.load() {
        Ok(Some(id)) => {
            tracing::debug!(session_id = %id, "Resuming stored session");
            return id;
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(error = %e, "Session storage unreadable, using in-memory session id");
        }
    }

    let id = generate_session_id();
    persist_session_id(store, &id);
    id
}

/// Store `session_id`, logging instead of failing when storage is unavailable.
pub fn persist_session_id(store: &dyn SessionStore, session_id: &str) {
    if let Err(e) = store.store(session_id) {
        tracing::warn!(
            error = %e,
            session_id = %session_id,
            "Could not persist session id, keeping it in memory only"
        );
    }
}

/// Process-local session store. Clones share the same slot, which lets tests
/// simulate a reload by handing a clone to a second manager.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(session_id: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(session_id.into()))),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>> {
        self.slot
            .lock()
            .map_err(|_| ChatError::storage("session slot poisoned"))
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.lock()?.clone())
    }

    fn store(&self, session_id: &str) -> Result<()> {
        *self.lock()? = Some(session_id.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.lock()? = None;
        Ok(())
    }
}
