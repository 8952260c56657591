//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use parking_lot::RwLock;

use lead_agent_config::Settings;
use lead_agent_orchestrator::LeadOrchestrator;

use crate::session::SessionManager;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RwLock<Settings>>,
    pub sessions: Arc<SessionManager>,
    pub orchestrator: Arc<LeadOrchestrator>,
    /// Present when the Prometheus recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: Settings, orchestrator: LeadOrchestrator) -> Self {
        let sessions = Arc::new(SessionManager::from_config(&config.session));
        Self {
            config: Arc::new(RwLock::new(config)),
            sessions,
            orchestrator: Arc::new(orchestrator),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Get a read guard to the current configuration
    pub fn get_config(&self) -> parking_lot::RwLockReadGuard<'_, Settings> {
        self.config.read()
    }
}
