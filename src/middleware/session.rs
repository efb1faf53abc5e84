use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::traits::SessionStore;
use crate::types::SessionId;

/// Keys a session can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKey {
    Token,
    Username,
}

/// Per-user session state.
///
/// The presence of a non-empty `token` is the only signal of "authenticated".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    token: Option<String>,
    username: Option<String>,
}

impl Session {
    /// A session for a freshly logged-in user.
    #[must_use]
    pub fn authenticated(token: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            username: Some(username.into()),
        }
    }

    #[must_use]
    pub fn get(&self, key: SessionKey) -> Option<&str> {
        match key {
            SessionKey::Token => self.token.as_deref(),
            SessionKey::Username => self.username.as_deref(),
        }
    }

    pub fn set(&mut self, key: SessionKey, value: impl Into<String>) {
        let slot = match key {
            SessionKey::Token => &mut self.token,
            SessionKey::Username => &mut self.username,
        };
        *slot = Some(value.into());
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Bearer token, if present and non-empty.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

/// Default idle timeout of [`MemorySessionStore`].
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(20 * 60);

struct Entry {
    session: Session,
    touched: Instant,
}

/// In-process [`SessionStore`] with idle expiry.
///
/// Cloning shares the underlying map.
#[derive(Clone)]
pub struct MemorySessionStore {
    entries: Arc<RwLock<HashMap<SessionId, Entry>>>,
    idle_timeout: Duration,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// Override how long an untouched session survives.
    #[must_use]
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Synchronous snapshot, used by tests and diagnostics.
    #[must_use]
    pub fn snapshot(&self, id: &SessionId) -> Session {
        self.read(id)
    }

    fn read(&self, id: &SessionId) -> Session {
        let mut entries = self.entries.write();
        match entries.get_mut(id) {
            Some(entry) if entry.touched.elapsed() < self.idle_timeout => {
                entry.touched = Instant::now();
                entry.session.clone()
            }
            Some(_) => {
                tracing::debug!(session_id = %id, "Session idle timeout reached");
                entries.remove(id);
                Session::default()
            }
            None => Session::default(),
        }
    }
}

impl SessionStore for MemorySessionStore {
    async fn load(
        &self,
        id: &SessionId,
    ) -> Result<Session, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.read(id))
    }

    async fn save(
        &self,
        id: &SessionId,
        session: Session,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut entries = self.entries.write();
        // Abandoned sessions are never read again; sweep them on every write.
        let before = entries.len();
        entries.retain(|_, entry| entry.touched.elapsed() < self.idle_timeout);
        let purged = before - entries.len();
        if purged > 0 {
            tracing::debug!(purged, "Idle sessions purged");
        }
        entries.insert(
            id.clone(),
            Entry {
                session,
                touched: Instant::now(),
            },
        );
        Ok(())
    }

    async fn clear(&self, id: &SessionId) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.entries.write().remove(id);
        Ok(())
    }
}
