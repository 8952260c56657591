//! Lead Agent Server
//!
//! Main entry point for the lead qualification agent.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use lead_agent_config::{load_settings, Settings};
use lead_agent_llm::create_language_model;
use lead_agent_orchestrator::LeadOrchestrator;
use lead_agent_server::{create_notifier, create_router, init_metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // env vars > config/{env} > config/default > defaults
    let env = std::env::var("LEAD_AGENT_ENV").ok();
    let config = match load_settings(env.as_deref()) {
        Ok(settings) => {
            // Tracing not yet initialized
            eprintln!(
                "Loaded configuration from files (env: {})",
                env.as_deref().unwrap_or("default")
            );
            settings
        }
        Err(e) => {
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        }
    };

    init_tracing(&config);

    tracing::info!("Starting Lead Agent Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = ?config.environment,
        config_path = env.as_deref().unwrap_or("default"),
        "Configuration loaded"
    );

    if let Err(e) = config.validate() {
        if config.environment.is_strict() {
            return Err(e).context("invalid configuration");
        }
        tracing::warn!(error = %e, "Configuration failed validation, continuing");
    }

    let metrics_handle = if config.observability.metrics_enabled {
        match init_metrics() {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install Prometheus recorder");
                None
            }
        }
    } else {
        None
    };

    let llm = create_language_model(&config.llm).context("failed to create language model")?;
    tracing::info!(provider = ?config.llm.provider, model = %llm.model_name(), "Language model ready");

    let notifier = create_notifier(&config.notification).context("failed to create notifier")?;
    let orchestrator = LeadOrchestrator::from_settings(llm, &config.llm, &config.qualification)
        .with_notifier(notifier)
        .with_delivery_attempts(config.notification.max_delivery_attempts);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;

    let mut state = AppState::new(config, orchestrator);
    if let Some(handle) = metrics_handle {
        state = state.with_metrics(handle);
    }

    let sweep_shutdown = state
        .sessions
        .start_sweep_task(Arc::clone(&state.orchestrator));
    let cleanup_shutdown = state.sessions.start_cleanup_task();
    let limits = *state.sessions.limits();
    tracing::info!(
        inactivity_timeout_secs = limits.inactivity_timeout.as_secs(),
        ttl_secs = limits.ttl.as_secs(),
        max_sessions = limits.max_sessions,
        "Session lifecycle tasks started"
    );

    let app = create_router(state);

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = sweep_shutdown.send(true);
    let _ = cleanup_shutdown.send(true);
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("lead_agent={},tower_http=debug", level).into()
    });

    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
