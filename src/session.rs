//! Session store — one in-progress conversation per user, with idle expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::dialog::state::Flow;

struct Session {
    flow: Flow,
    last_active: Instant,
}

/// Keyed mapping from Telegram user id to that user's conversation state.
///
/// Every `get` and `set` refreshes the activity timestamp; the sweep task
/// removes sessions idle past the timeout. Expiry is housekeeping only: an
/// expired session behaves as absent on the next access.
pub struct SessionStore {
    sessions: RwLock<HashMap<i64, Session>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        })
    }

    /// Current flow for a user, refreshing its activity timestamp.
    pub async fn get(&self, user_id: i64) -> Option<Flow> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&user_id)?;
        session.last_active = Instant::now();
        Some(session.flow.clone())
    }

    /// Overwrite (or create) a user's session.
    pub async fn set(&self, user_id: i64, flow: Flow) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            user_id,
            Session {
                flow,
                last_active: Instant::now(),
            },
        );
    }

    pub async fn remove(&self, user_id: i64) {
        self.sessions.write().await.remove(&user_id);
    }

    /// Drop sessions idle past the timeout. Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.last_active.elapsed() <= self.idle_timeout);
        let removed = before - sessions.len();
        if removed > 0 {
            debug!(removed, "Swept idle sessions");
        }
        removed
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Spawn the periodic sweep task.
pub fn spawn_sweep_task(
    store: Arc<SessionStore>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(interval);
        loop {
            interval.tick().await;
            store.sweep().await;
        }
    })
}
