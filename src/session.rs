//! Per-browser session state and its in-memory store.
//!
//! A [`Session`] is a plain value. Action handlers in [`crate::chat`] take it
//! by value and return the updated session; the store only decides which
//! session a request belongs to and serialises actions within one session.
//!
//! Lifecycle: created on the first request without a known session id,
//! mutated only through the chat handlers, destroyed by [`SessionStore::end`]
//! or dropped once idle for longer than the configured timeout. Nothing is
//! persisted.

use crate::pipeline::model::ModelChoice;
use crate::transcript::Transcript;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

pub type SessionId = Uuid;

/// State of one browser session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub transcript: Transcript,
    /// Model picked in the selector.
    pub model: ModelChoice,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A session slot. Holding the lock means owning the session for one action.
pub type SessionCell = Arc<Mutex<Session>>;

struct Entry {
    cell: SessionCell,
    last_seen: Instant,
}

/// In-memory map from session id to session.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Entry>>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Return the session for `id`, creating a fresh one when `id` is absent,
    /// unknown or expired. The boolean is `true` when a session was created.
    ///
    /// Idle sessions are pruned here; there is no background sweeper.
    pub fn open(&self, id: Option<SessionId>) -> (SessionId, SessionCell, bool) {
        let now = Instant::now();
        let mut sessions = self.sessions.write();

        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) <= self.idle_timeout);
        if sessions.len() < before {
            debug!("Pruned {} idle sessions", before - sessions.len());
        }

        if let Some(id) = id {
            if let Some(entry) = sessions.get_mut(&id) {
                entry.last_seen = now;
                return (id, Arc::clone(&entry.cell), false);
            }
        }

        let id = Uuid::new_v4();
        let cell: SessionCell = Arc::new(Mutex::new(Session::new()));
        sessions.insert(
            id,
            Entry {
                cell: Arc::clone(&cell),
                last_seen: now,
            },
        );
        info!("created session (session_id={})", id);
        (id, cell, true)
    }

    /// Destroy a session. Returns whether it existed.
    pub fn end(&self, id: SessionId) -> bool {
        let removed = self.sessions.write().remove(&id).is_some();
        if removed {
            info!("ended session (session_id={})", id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
