//! Bearer-token authentication
//!
//! Checks `Authorization: Bearer <api_key>` against `server.auth.api_key`.
//! Paths listed in `server.auth.public_paths` are always allowed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use parking_lot::RwLock;

use lead_agent_config::Settings;

use crate::ServerError;

static AUTH_DISABLED_WARNED: AtomicBool = AtomicBool::new(false);

enum AuthCheck {
    Skip,
    Misconfigured,
    Expect(String),
}

/// Read what the request needs without holding the lock across an await
fn check_auth_config(config: &RwLock<Settings>, path: &str) -> AuthCheck {
    let settings = config.read();
    let auth = &settings.server.auth;

    if !auth.enabled {
        if !AUTH_DISABLED_WARNED.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                "API authentication is disabled; set LEAD_AGENT__SERVER__AUTH__ENABLED=true in production"
            );
        }
        return AuthCheck::Skip;
    }

    if auth.public_paths.iter().any(|p| path.starts_with(p.as_str())) {
        return AuthCheck::Skip;
    }

    match &auth.api_key {
        Some(key) if !key.is_empty() => AuthCheck::Expect(key.clone()),
        _ => AuthCheck::Misconfigured,
    }
}

/// Authentication middleware
///
/// Expects the shared settings as an `Arc<RwLock<Settings>>` request
/// extension.
pub async fn auth_middleware(request: Request, next: Next) -> Response {
    let Some(config) = request.extensions().get::<Arc<RwLock<Settings>>>().cloned() else {
        tracing::error!("Config extension not found in request");
        return ServerError::Internal("server configuration error".into()).into_response();
    };

    let expected = match check_auth_config(&config, request.uri().path()) {
        AuthCheck::Skip => return next.run(request).await,
        AuthCheck::Misconfigured => {
            tracing::error!("Auth is enabled but no API key is configured");
            return ServerError::Internal("authentication not configured".into()).into_response();
        }
        AuthCheck::Expect(key) => key,
    };

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").map(str::to_string));

    match provided {
        Some(Some(token)) if constant_time_compare(token.as_bytes(), expected.as_bytes()) => {
            next.run(request).await
        }
        Some(Some(_)) => {
            tracing::warn!(path = %request.uri().path(), "Invalid API key");
            ServerError::Auth("invalid API key".into()).into_response()
        }
        Some(None) => ServerError::InvalidRequest(
            "invalid Authorization header, expected: Bearer <token>".into(),
        )
        .into_response(),
        None => ServerError::Auth("missing Authorization header".into()).into_response(),
    }
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
