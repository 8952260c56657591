//! Session Management
//!
//! Sessions live in memory. Ordered indexes on last activity and creation
//! time let the inactivity sweep and the eviction pass visit only sessions
//! that are actually due, instead of scanning the whole map. Closed sessions
//! move to their own index so the sweep no longer sees them.
//!
//! Lifecycle:
//! - idle past `inactivity_timeout` → finalized by the orchestrator
//!   (abandoned sessions are dropped right away, completed ones are kept,
//!   pending hand-offs are retried on the next sweep)
//! - idle past `ttl` or older than `retention` → evicted

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::{watch, Mutex as AsyncMutex, MutexGuard};
use tokio::time::Instant;

use lead_agent_config::SessionConfig;
use lead_agent_core::{ConversationState, ConversationStatus};
use lead_agent_orchestrator::{LeadOrchestrator, SessionDisposition};

use crate::ServerError;

/// One conversation
pub struct Session {
    pub id: String,
    pub created_at: Instant,
    pub started_at: DateTime<Utc>,
    /// Only written by [`SessionManager::touch`] so the index stays in sync
    last_activity: Mutex<Instant>,
    state: AsyncMutex<ConversationState>,
}

impl Session {
    fn new(id: String) -> Self {
        let now = Instant::now();
        Self {
            state: AsyncMutex::new(ConversationState::new(&id)),
            id,
            created_at: now,
            started_at: Utc::now(),
            last_activity: Mutex::new(now),
        }
    }

    pub fn last_activity(&self) -> Instant {
        *self.last_activity.lock()
    }

    pub fn idle_for(&self) -> Duration {
        Instant::now().saturating_duration_since(self.last_activity())
    }

    /// Wait for exclusive access to the conversation
    pub async fn lock(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().await
    }

    /// Exclusive access if no turn is running
    pub fn try_lock(&self) -> Option<MutexGuard<'_, ConversationState>> {
        self.state.try_lock().ok()
    }
}

/// Listing entry for a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub idle_secs: u64,
    /// `None` while a turn is in progress
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ConversationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_count: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    pub max_sessions: usize,
    pub inactivity_timeout: Duration,
    pub ttl: Duration,
    pub retention: Duration,
    pub sweep_interval: Duration,
    pub cleanup_interval: Duration,
}

impl SessionLimits {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            max_sessions: config.max_sessions,
            inactivity_timeout: Duration::from_secs(config.inactivity_timeout_secs),
            ttl: Duration::from_secs(config.ttl_secs),
            retention: Duration::from_secs(config.retention_secs),
            sweep_interval: Duration::from_secs(config.sweep_interval_secs.max(1)),
            cleanup_interval: Duration::from_secs(config.cleanup_interval_secs.max(1)),
        }
    }
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

/// Result of one inactivity sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub abandoned: usize,
    pub completed: usize,
    /// Hand-off failed; retried on a later sweep
    pub pending: usize,
    /// Idle sessions skipped because a turn held the lock
    pub busy: usize,
}

#[derive(Default)]
struct ExpiryIndex {
    /// Open sessions, swept for inactivity
    by_activity: BTreeSet<(Instant, String)>,
    by_creation: BTreeSet<(Instant, String)>,
    /// Closed sessions by last activity; only checked against the TTL
    closed: BTreeSet<(Instant, String)>,
}

impl ExpiryIndex {
    fn insert(&mut self, session: &Session) {
        self.by_activity
            .insert((session.last_activity(), session.id.clone()));
        self.by_creation.insert((session.created_at, session.id.clone()));
    }

    fn remove(&mut self, session: &Session) {
        let key = (session.last_activity(), session.id.clone());
        self.by_activity.remove(&key);
        self.closed.remove(&key);
        self.by_creation.remove(&(session.created_at, session.id.clone()));
    }

    /// Stop sweeping a closed session; it stays subject to eviction
    fn retire(&mut self, session: &Session) {
        let key = (session.last_activity(), session.id.clone());
        if self.by_activity.remove(&key) {
            self.closed.insert(key);
        }
    }

    fn due(set: &BTreeSet<(Instant, String)>, cutoff: Option<Instant>) -> Vec<String> {
        let Some(cutoff) = cutoff else {
            return Vec::new();
        };
        set.iter()
            .take_while(|(at, _)| *at <= cutoff)
            .map(|(_, id)| id.clone())
            .collect()
    }

    fn idle_since(&self, cutoff: Option<Instant>) -> Vec<String> {
        Self::due(&self.by_activity, cutoff)
    }

    fn closed_since(&self, cutoff: Option<Instant>) -> Vec<String> {
        Self::due(&self.closed, cutoff)
    }

    fn created_before(&self, cutoff: Option<Instant>) -> Vec<String> {
        Self::due(&self.by_creation, cutoff)
    }
}

/// Session manager
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    index: Mutex<ExpiryIndex>,
    limits: SessionLimits,
}

impl SessionManager {
    pub fn new(limits: SessionLimits) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            index: Mutex::new(ExpiryIndex::default()),
            limits,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(SessionLimits::from_config(config))
    }

    pub fn limits(&self) -> &SessionLimits {
        &self.limits
    }

    /// Create a new session
    ///
    /// At capacity, expired sessions are evicted first; if that frees
    /// nothing the request is rejected.
    pub fn create(&self) -> Result<Arc<Session>, ServerError> {
        let mut sessions = self.sessions.write();

        if sessions.len() >= self.limits.max_sessions {
            self.evict_expired_internal(&mut sessions);

            if sessions.len() >= self.limits.max_sessions {
                tracing::warn!(max_sessions = self.limits.max_sessions, "Session capacity reached");
                return Err(ServerError::Capacity);
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(Session::new(id.clone()));
        self.index.lock().insert(&session);
        sessions.insert(id.clone(), session.clone());

        metrics::counter!("lead_agent_sessions_created_total").increment(1);
        metrics::gauge!("lead_agent_active_sessions").set(sessions.len() as f64);
        tracing::info!(session_id = %id, "Created session");

        Ok(session)
    }

    /// Get a session by ID
    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().get(id).cloned()
    }

    /// Record activity on a session
    pub fn touch(&self, session: &Session) {
        let mut index = self.index.lock();
        let mut last = session.last_activity.lock();
        let now = Instant::now();
        let key = (*last, session.id.clone());
        // Removed sessions stay out of the index
        if index.by_activity.remove(&key) {
            index.by_activity.insert((now, session.id.clone()));
        } else if index.closed.remove(&key) {
            index.closed.insert((now, session.id.clone()));
        }
        *last = now;
    }

    /// Remove a session
    pub fn remove(&self, id: &str) -> Option<Arc<Session>> {
        let mut sessions = self.sessions.write();
        let removed = sessions.remove(id);
        if let Some(session) = &removed {
            self.index.lock().remove(session);
            metrics::gauge!("lead_agent_active_sessions").set(sessions.len() as f64);
            tracing::info!(session_id = %id, "Removed session");
        }
        removed
    }

    /// Get active session count
    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Summaries of all sessions, most recently active first
    pub fn list(&self) -> Vec<SessionSummary> {
        let mut sessions: Vec<Arc<Session>> = self.sessions.read().values().cloned().collect();
        sessions.sort_by_key(|s| std::cmp::Reverse(s.last_activity()));

        sessions
            .iter()
            .map(|session| {
                let state = session.try_lock();
                SessionSummary {
                    session_id: session.id.clone(),
                    started_at: session.started_at,
                    idle_secs: session.idle_for().as_secs(),
                    status: state.as_ref().map(|s| s.conversation_status),
                    message_count: state.as_ref().map(|s| s.messages.len()),
                }
            })
            .collect()
    }

    fn idle_sessions(&self, timeout: Duration) -> Vec<Arc<Session>> {
        let ids = self
            .index
            .lock()
            .idle_since(Instant::now().checked_sub(timeout));
        let sessions = self.sessions.read();
        ids.iter().filter_map(|id| sessions.get(id).cloned()).collect()
    }

    /// Finalize sessions idle past the inactivity timeout
    ///
    /// Sessions with a turn in progress are left for the next sweep.
    /// Abandoned sessions are dropped; completed ones stay readable until
    /// evicted; pending ones are visited again next time.
    pub async fn sweep_inactive(&self, orchestrator: &LeadOrchestrator) -> SweepReport {
        let candidates = self.idle_sessions(self.limits.inactivity_timeout);
        if candidates.is_empty() {
            return SweepReport::default();
        }

        let outcomes = join_all(candidates.iter().map(|session| async move {
            let mut state = session.try_lock()?;
            if state.conversation_status.is_closed() {
                return Some(None);
            }
            tracing::debug!(
                session_id = %session.id,
                idle_secs = session.idle_for().as_secs(),
                "Finalizing idle session"
            );
            Some(Some(orchestrator.finalize_inactive(&mut state).await))
        }))
        .await;

        let mut report = SweepReport::default();
        for (session, outcome) in candidates.iter().zip(outcomes) {
            if let Some(Some(disposition)) = outcome {
                metrics::counter!("lead_agent_sessions_timed_out_total", "outcome" => disposition.as_str())
                    .increment(1);
            }
            match outcome {
                None => report.busy += 1,
                Some(None) => self.index.lock().retire(session),
                Some(Some(SessionDisposition::Abandoned)) => {
                    self.remove(&session.id);
                    report.abandoned += 1;
                }
                Some(Some(SessionDisposition::Completed)) => {
                    self.index.lock().retire(session);
                    report.completed += 1;
                }
                Some(Some(SessionDisposition::Pending)) => report.pending += 1,
            }
        }

        if report != SweepReport::default() {
            tracing::info!(
                abandoned = report.abandoned,
                completed = report.completed,
                pending = report.pending,
                busy = report.busy,
                "Inactivity sweep finished"
            );
        }
        report
    }

    /// Evict sessions idle past the TTL or older than the retention window
    pub fn evict_expired(&self) -> usize {
        let mut sessions = self.sessions.write();
        self.evict_expired_internal(&mut sessions)
    }

    fn evict_expired_internal(&self, sessions: &mut HashMap<String, Arc<Session>>) -> usize {
        let now = Instant::now();
        let mut index = self.index.lock();

        let ttl_cutoff = now.checked_sub(self.limits.ttl);
        let mut expired = index.idle_since(ttl_cutoff);
        expired.extend(index.closed_since(ttl_cutoff));
        expired.extend(index.created_before(now.checked_sub(self.limits.retention)));

        let mut evicted = 0;
        for id in expired {
            if let Some(session) = sessions.remove(&id) {
                index.remove(&session);
                evicted += 1;
                tracing::info!(session_id = %id, "Evicted expired session");
            }
        }

        if evicted > 0 {
            metrics::counter!("lead_agent_sessions_evicted_total").increment(evicted as u64);
            metrics::gauge!("lead_agent_active_sessions").set(sessions.len() as f64);
        }
        evicted
    }

    /// Periodically finalize idle sessions
    ///
    /// Returns a shutdown sender that stops the task.
    pub fn start_sweep_task(
        self: &Arc<Self>,
        orchestrator: Arc<LeadOrchestrator>,
    ) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let manager = Arc::clone(self);
        let period = manager.limits.sweep_interval;

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(period);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        manager.sweep_inactive(&orchestrator).await;
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Inactivity sweep task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }

    /// Periodically evict expired sessions
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let manager = Arc::clone(self);
        let period = manager.limits.cleanup_interval;

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(period);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let evicted = manager.evict_expired();
                        if evicted > 0 {
                            tracing::info!(
                                "Session cleanup: removed {} expired sessions ({} remaining)",
                                evicted,
                                manager.count()
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Session cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }
}
