//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-session usage state.

use crate::config::Config;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use study_notes_core::{
    ports::{HistoryStore, NoteExporter, NoteGenerationService, TokenCounter},
    SessionUsage, UsageGuard,
};
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

/// Sessions untouched for this long are dropped on the next `create`.
pub const DEFAULT_SESSION_IDLE_TTL_SECONDS: i64 = 24 * 60 * 60;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub guard: UsageGuard,
    pub notes_adapter: Arc<dyn NoteGenerationService>,
    pub token_counter: Arc<dyn TokenCounter>,
    pub history: Arc<dyn HistoryStore>,
    pub exporter: Arc<dyn NoteExporter>,
    pub sessions: Arc<SessionRegistry>,
}

/// Builds the usage guard described by the configuration.
pub fn usage_guard_from(config: &Config) -> UsageGuard {
    UsageGuard::new(
        config.daily_limit,
        Duration::seconds(i64::from(config.cooldown_seconds)),
    )
    .with_daily_rollover(config.quota_daily_rollover)
}

/// Builds the session table with the configured idle expiry.
pub fn session_registry_from(config: &Config) -> SessionRegistry {
    // `chrono::Duration` tops out at i64::MAX milliseconds.
    let ttl = i64::try_from(config.session_idle_ttl_seconds)
        .unwrap_or(i64::MAX)
        .min(i64::MAX / 1000);
    SessionRegistry::with_idle_ttl(Duration::seconds(ttl))
}

//=========================================================================================
// SessionState (Specific to One Browser Session)
//=========================================================================================

/// The state for a single session. Never persisted.
#[derive(Debug)]
pub struct SessionState {
    pub session_id: Uuid,
    pub usage: SessionUsage,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl SessionState {
    pub fn new(session_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            session_id,
            usage: SessionUsage::new(now),
            created_at: now,
            last_active: now,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_active {
            self.last_active = now;
        }
    }
}

/// In-memory table of live sessions. Idle sessions expire after `idle_ttl`.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<SessionState>>>>,
    idle_ttl: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_idle_ttl(Duration::seconds(DEFAULT_SESSION_IDLE_TTL_SECONDS))
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_ttl,
        }
    }

    /// Starts a session with zeroed counters and returns its id. Sessions
    /// idle for longer than the TTL are swept first.
    pub async fn create(&self, now: DateTime<Utc>) -> Uuid {
        let session_id = Uuid::new_v4();
        let state = Arc::new(Mutex::new(SessionState::new(session_id, now)));

        let mut sessions = self.sessions.write().await;
        self.sweep_idle(&mut sessions, now);
        sessions.insert(session_id, state);
        info!("{} live session(s)", sessions.len());
        session_id
    }

    fn sweep_idle(&self, sessions: &mut HashMap<Uuid, Arc<Mutex<SessionState>>>, now: DateTime<Utc>) {
        sessions.retain(|id, state| {
            // A locked session has a request in flight.
            let Ok(state) = state.try_lock() else {
                return true;
            };
            let keep = now - state.last_active < self.idle_ttl;
            if !keep {
                info!(
                    "Expiring idle session {} (created {}, last active {})",
                    id, state.created_at, state.last_active
                );
            }
            keep
        });
    }

    pub async fn get(&self, session_id: Uuid) -> Option<Arc<Mutex<SessionState>>> {
        self.sessions.read().await.get(&session_id).cloned()
    }

    /// Drops a session and its counters. Returns false if it did not exist.
    pub async fn remove(&self, session_id: Uuid) -> bool {
        self.sessions.write().await.remove(&session_id).is_some()
    }
}
