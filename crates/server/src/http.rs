//! HTTP Endpoints
//!
//! REST API for the lead qualification agent.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Json, Path, State},
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use lead_agent_core::{ConversationState, ConversationStatus};
use lead_agent_orchestrator::TurnOutcome;

use crate::auth::auth_middleware;
use crate::metrics::metrics_handler;
use crate::session::{Session, SessionSummary};
use crate::state::AppState;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let config = state.config.read();
    let cors_layer = build_cors_layer(&config.server.cors_origins, config.server.cors_enabled);
    let timeout = Duration::from_secs(config.server.timeout_seconds.max(1));
    drop(config);

    Router::new()
        .route("/api/sessions", post(create_session).get(list_sessions))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/chat", post(chat))
        .route("/api/chat/:session_id", post(chat_in_session))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .layer(axum::middleware::from_fn(auth_middleware))
        .layer(Extension(state.config.clone()))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// - disabled: permissive, for local development
/// - no origins configured: any origin
/// - otherwise: the configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];

    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed.is_empty() {
        tracing::error!("All configured CORS origins are invalid, refusing cross-origin requests");
        return CorsLayer::new().allow_methods(methods);
    }

    tracing::info!("CORS configured with {} origins", parsed.len());
    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods(methods)
        .allow_headers(Any)
}

#[derive(Debug, Serialize)]
struct SessionCreated {
    session_id: String,
    status: ConversationStatus,
    started_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionChatRequest {
    message: String,
}

/// Create session
async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionCreated>), ServerError> {
    let session = state.sessions.create()?;
    Ok((
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id: session.id.clone(),
            status: ConversationStatus::Active,
            started_at: session.started_at,
        }),
    ))
}

/// List sessions
async fn list_sessions(State(state): State<AppState>) -> Json<Vec<SessionSummary>> {
    Json(state.sessions.list())
}

/// Full conversation state
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationState>, ServerError> {
    let session = state
        .sessions
        .get(&id)
        .ok_or_else(|| ServerError::SessionNotFound(id))?;
    let snapshot = session.lock().await.clone();
    Ok(Json(snapshot))
}

/// Delete session
async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    state
        .sessions
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(ServerError::SessionNotFound(id))
}

/// Chat, creating a session when no id is given
async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<TurnOutcome>, ServerError> {
    if request.message.trim().is_empty() {
        return Err(ServerError::InvalidRequest(
            "message must not be empty".to_string(),
        ));
    }
    let session = match request.session_id {
        Some(id) => state
            .sessions
            .get(&id)
            .ok_or(ServerError::SessionNotFound(id))?,
        None => state.sessions.create()?,
    };
    run_turn(&state, session, request.message).await
}

/// Chat within an existing session
async fn chat_in_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<SessionChatRequest>,
) -> Result<Json<TurnOutcome>, ServerError> {
    let session = state
        .sessions
        .get(&session_id)
        .ok_or(ServerError::SessionNotFound(session_id))?;
    run_turn(&state, session, request.message).await
}

/// Runs the turn on its own task so a request timeout or a dropped client
/// cannot abandon it between stages
async fn run_turn(
    state: &AppState,
    session: Arc<Session>,
    message: String,
) -> Result<Json<TurnOutcome>, ServerError> {
    let sessions = Arc::clone(&state.sessions);
    let orchestrator = Arc::clone(&state.orchestrator);

    let turn = tokio::spawn(async move {
        sessions.touch(&session);
        let outcome = {
            let mut conversation = session.lock().await;
            orchestrator.process_message(&mut conversation, &message).await
        };
        sessions.touch(&session);
        outcome
    });

    let outcome = turn.await.map_err(|e| {
        tracing::error!(error = %e, "Turn task failed");
        ServerError::Internal("turn did not complete".to_string())
    })?;
    Ok(Json(outcome?))
}

/// Health check
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.sessions.count(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use lead_agent_config::Settings;
    use lead_agent_core::{GenerateRequest, GenerateResponse, LanguageModel};
    use lead_agent_llm::OfflineBackend;
    use lead_agent_orchestrator::LeadOrchestrator;
    use tower::ServiceExt;

    fn app_with(settings: Settings) -> Router {
        let orchestrator =
            LeadOrchestrator::new(Arc::new(OfflineBackend::new()), &settings.qualification);
        create_router(AppState::new(settings, orchestrator))
    }

    fn app() -> Router {
        app_with(Settings::default())
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_chat_creates_session() {
        let app = app();

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/chat",
                serde_json::json!({ "message": "Hi, I'm looking at claims automation" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let session_id = body["session_id"].as_str().unwrap().to_string();
        assert!(!body["response"].as_str().unwrap().is_empty());
        assert_eq!(body["status"], "active");

        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/api/chat/{}", session_id),
                serde_json::json!({ "message": "I'm Dana from Northwind Mutual" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(get(&format!("/api/sessions/{}", session_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let state = json_body(response).await;
        assert_eq!(state["messages"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let app = app();
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/chat/missing",
                serde_json::json!({ "message": "hello" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.oneshot(get("/api/sessions/missing")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let response = app()
            .oneshot(post_json("/api/chat", serde_json::json!({ "message": "   " })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_message_creates_no_session() {
        let app = app();
        for body in [
            serde_json::json!({ "message": "" }),
            serde_json::json!({ "message": "  \n " }),
        ] {
            let response = app
                .clone()
                .oneshot(post_json("/api/chat", body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        let listed = json_body(app.oneshot(get("/api/sessions")).await.unwrap()).await;
        assert!(listed.as_array().unwrap().is_empty());
    }

    /// Answers after a fixed delay
    struct SlowModel {
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl LanguageModel for SlowModel {
        async fn generate(
            &self,
            _request: GenerateRequest,
        ) -> lead_agent_core::Result<GenerateResponse> {
            tokio::time::sleep(self.delay).await;
            Ok(GenerateResponse::text("What does your claims intake look like today?"))
        }

        fn model_name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_request_still_finishes_turn() {
        let mut settings = Settings::default();
        settings.server.timeout_seconds = 1;
        let llm = Arc::new(SlowModel {
            delay: Duration::from_secs(3),
        });
        let orchestrator = LeadOrchestrator::new(llm, &settings.qualification);
        let app = create_router(AppState::new(settings, orchestrator));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/sessions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let session_id = json_body(response).await["session_id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/api/chat/{}", session_id),
                serde_json::json!({ "message": "We process claims by hand today" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

        tokio::time::sleep(Duration::from_secs(5)).await;

        let response = app
            .oneshot(get(&format!("/api/sessions/{}", session_id)))
            .await
            .unwrap();
        let state = json_body(response).await;
        let messages = state["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(
            messages[1]["content"],
            "What does your claims intake look like today?"
        );
        assert!(!state["agent_executions"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let app = app();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/sessions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let session_id = json_body(response).await["session_id"]
            .as_str()
            .unwrap()
            .to_string();

        let listed = json_body(app.clone().oneshot(get("/api/sessions")).await.unwrap()).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let delete = || {
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/sessions/{}", session_id))
                .body(Body::empty())
                .unwrap()
        };
        let response = app.clone().oneshot(delete()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = app.oneshot(delete()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_capacity_returns_service_unavailable() {
        let mut settings = Settings::default();
        settings.session.max_sessions = 1;
        let app = app_with(settings);

        let first = app
            .clone()
            .oneshot(post_json("/api/chat", serde_json::json!({ "message": "hello there" })))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .oneshot(post_json("/api/chat", serde_json::json!({ "message": "hello again" })))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_bearer_auth() {
        let mut settings = Settings::default();
        settings.server.auth.enabled = true;
        settings.server.auth.api_key = Some("s3cret".into());
        let app = app_with(settings);

        let response = app.clone().oneshot(get("/api/sessions")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/sessions")
                    .header("authorization", "Bearer wrong")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/sessions")
                    .header("authorization", "Bearer s3cret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_without_recorder() {
        let response = app().oneshot(get("/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
