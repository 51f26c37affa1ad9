use crate::clock::{Clock, SessionClock, SystemClock};
use crate::errors::AppError;
use crate::session::{ClickSession, EngineSettings};
use chrono::{DateTime, Duration, Utc};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use tokio::sync::Mutex;
use tracing::info;

pub type SharedClock = Arc<dyn Clock>;

/// A live session plus the clock that timestamps its commands.
#[derive(Clone)]
pub struct SessionHandle {
    pub session: Arc<Mutex<ClickSession>>,
    pub clock: SessionClock<SharedClock>,
}

impl SessionHandle {
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

struct SessionEntry {
    handle: SessionHandle,
    last_touched: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AppState {
    pub clock: SharedClock,
    pub settings: EngineSettings,
    session_ttl: Duration,
    sessions: Arc<Mutex<HashMap<u64, SessionEntry>>>,
    next_id: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(settings: EngineSettings, session_ttl: Duration) -> Self {
        Self::with_clock(settings, session_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: EngineSettings, session_ttl: Duration, clock: SharedClock) -> Self {
        Self {
            clock,
            settings,
            session_ttl,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn create_session(&self) -> (u64, DateTime<Utc>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let clock = SessionClock::start(Arc::clone(&self.clock));
        let session_start = clock.session_start();
        let handle = SessionHandle {
            session: Arc::new(Mutex::new(ClickSession::new(session_start, self.settings.clone()))),
            clock,
        };

        let mut sessions = self.sessions.lock().await;
        evict_idle(&mut sessions, session_start, self.session_ttl);
        sessions.insert(
            id,
            SessionEntry {
                handle,
                last_touched: session_start,
            },
        );
        (id, session_start)
    }

    /// Looks up a session and marks it as used. The registry lock is
    /// released before the caller locks the session itself.
    pub async fn session(&self, id: u64) -> Result<SessionHandle, AppError> {
        let now = self.now();
        let mut sessions = self.sessions.lock().await;
        evict_idle(&mut sessions, now, self.session_ttl);
        let entry = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("no session {id}")))?;
        entry.last_touched = now;
        Ok(entry.handle.clone())
    }

    pub async fn remove_session(&self, id: u64) -> bool {
        self.sessions.lock().await.remove(&id).is_some()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

fn evict_idle(sessions: &mut HashMap<u64, SessionEntry>, now: DateTime<Utc>, ttl: Duration) {
    sessions.retain(|id, entry| {
        let idle = now - entry.last_touched;
        if idle <= ttl {
            return true;
        }
        info!(
            session_id = *id,
            idle_secs = idle.num_seconds(),
            age_secs = entry.handle.clock.elapsed().num_seconds(),
            "session expired"
        );
        false
    });
}
