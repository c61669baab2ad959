//! In-memory session registry
//!
//! Sessions live from the first request bearing their id until a terminal
//! event clears them. Each session has its own lock: a [`SessionTurn`] holds
//! it while one request is processed, so requests for the same session run
//! one at a time while other sessions proceed independently.

use crate::request::NormalizedRequest;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tokio::task::JoinHandle;

/// Request history of one session
#[derive(Debug)]
pub struct Session {
    id: String,
    requests: Vec<NormalizedRequest>,
    last_seen: Instant,
}

impl Session {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            requests: Vec::new(),
            last_seen: Instant::now(),
        }
    }

    /// Requests in arrival order
    pub fn requests(&self) -> &[NormalizedRequest] {
        &self.requests
    }
}

/// Registry entry; `closed` is set when the session is cleared so that a
/// request still waiting on its lock does not append to a discarded history
struct SessionSlot {
    closed: AtomicBool,
    session: Arc<Mutex<Session>>,
}

/// Exclusive access to a session for the duration of one request
pub struct SessionTurn {
    session: OwnedMutexGuard<Session>,
}

impl SessionTurn {
    pub fn session_id(&self) -> &str {
        &self.session.id
    }

    /// The request this turn was opened for
    pub fn latest(&self) -> &NormalizedRequest {
        // A turn is only handed out after its request was appended
        &self.session.requests[self.session.requests.len() - 1]
    }

    pub fn history(&self) -> &[NormalizedRequest] {
        self.session.requests()
    }
}

/// Process-wide map of session id to request history
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<SessionSlot>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `request` to the session, creating the session if needed.
    ///
    /// Waits while another request of the same session is being processed.
    /// The returned turn keeps the session locked until dropped, so do not
    /// call [`latest`](Self::latest) for the same session while holding it.
    pub async fn record_request(&self, session_id: &str, request: NormalizedRequest) -> SessionTurn {
        loop {
            let slot = self.slot_for(session_id).await;
            let mut session = Arc::clone(&slot.session).lock_owned().await;
            if slot.closed.load(Ordering::Acquire) {
                // Cleared while we waited; start over with a fresh session
                continue;
            }
            session.requests.push(request);
            session.last_seen = Instant::now();
            return SessionTurn { session };
        }
    }

    async fn slot_for(&self, session_id: &str) -> Arc<SessionSlot> {
        if let Some(slot) = self.sessions.read().await.get(session_id) {
            return Arc::clone(slot);
        }

        let mut sessions = self.sessions.write().await;
        let slot = sessions.entry(session_id.to_string()).or_insert_with(|| {
            tracing::info!(session_id = %session_id, "New session");
            Arc::new(SessionSlot {
                closed: AtomicBool::new(false),
                session: Arc::new(Mutex::new(Session::new(session_id))),
            })
        });
        Arc::clone(slot)
    }

    /// Most recent request of a session, `None` if the session is unknown
    #[cfg(test)]
    pub async fn latest(&self, session_id: &str) -> Option<NormalizedRequest> {
        let slot = self.sessions.read().await.get(session_id).cloned()?;
        let session = slot.session.lock().await;
        session.requests.last().cloned()
    }

    /// Remove a session. Returns whether it existed.
    pub async fn clear(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id);
        match removed {
            Some(slot) => {
                slot.closed.store(true, Ordering::Release);
                tracing::info!(session_id = %session_id, "Cleaning up session");
                true
            }
            None => false,
        }
    }

    /// Remove every session. Returns how many were removed.
    pub async fn clear_all(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        for slot in sessions.values() {
            slot.closed.store(true, Ordering::Release);
        }
        let count = sessions.len();
        sessions.clear();
        count
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Remove sessions idle for at least `max_idle`. Sessions with a request
    /// in flight are kept. Returns how many were removed.
    pub async fn sweep_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|session_id, slot| {
            let Ok(session) = slot.session.try_lock() else {
                return true;
            };
            if now.duration_since(session.last_seen) < max_idle {
                return true;
            }
            slot.closed.store(true, Ordering::Release);
            tracing::info!(session_id = %session_id, "Expiring idle session");
            false
        });

        before - sessions.len()
    }

    /// Periodically sweep sessions idle for longer than `max_idle`
    pub fn spawn_idle_sweeper(self: &Arc<Self>, max_idle: Duration) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        let period = (max_idle / 2).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let removed = registry.sweep_idle(max_idle).await;
                if removed > 0 {
                    let remaining = registry.len().await;
                    tracing::info!(removed, remaining, "Swept idle sessions");
                }
            }
        })
    }
}
