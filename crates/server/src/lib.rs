//! Lead Agent Server
//!
//! HTTP API, in-memory session lifecycle and lead delivery for the lead
//! qualification agent.

pub mod auth;
pub mod http;
pub mod metrics;
pub mod notifier;
pub mod session;
pub mod state;

pub use crate::auth::auth_middleware;
pub use crate::http::create_router;
pub use crate::metrics::{init_metrics, metrics_handler};
pub use crate::notifier::{create_notifier, WebhookNotifier};
pub use crate::session::{Session, SessionLimits, SessionManager, SessionSummary, SweepReport};
pub use crate::state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lead_agent_orchestrator::OrchestratorError;
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session {0} is closed")]
    SessionClosed(String),

    #[error("Session capacity reached")]
    Capacity,

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::SessionClosed(_) => StatusCode::CONFLICT,
            ServerError::Capacity => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Auth(_) => StatusCode::UNAUTHORIZED,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServerError> for StatusCode {
    fn from(err: ServerError) -> Self {
        err.status_code()
    }
}

impl From<OrchestratorError> for ServerError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::InvalidInput(msg) => ServerError::InvalidRequest(msg),
            OrchestratorError::SessionClosed(id) => ServerError::SessionClosed(id),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
