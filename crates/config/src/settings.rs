//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Relaxed validation
    #[default]
    Development,
    Staging,
    /// All validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub qualification: QualificationConfig,

    #[serde(default)]
    pub notification: NotificationConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_llm()?;
        self.validate_session()?;
        self.validate_qualification()?;
        self.validate_turn_budget()?;
        Ok(())
    }

    /// A turn makes one model request and at most one webhook call; the
    /// request timeout must outlast both.
    fn validate_turn_budget(&self) -> Result<(), ConfigError> {
        let turn_budget = self.llm.retry_budget()
            + Duration::from_secs(self.notification.webhook_timeout_secs);
        let request_timeout = Duration::from_secs(self.server.timeout_seconds);
        if request_timeout < turn_budget {
            return Err(invalid(
                "server.timeout_seconds",
                format!(
                    "Request timeout ({}s) is shorter than the worst-case turn ({:.1}s of model retries and webhook delivery)",
                    self.server.timeout_seconds,
                    turn_budget.as_secs_f64()
                ),
            ));
        }
        if self.notification.max_delivery_attempts == 0 {
            return Err(invalid(
                "notification.max_delivery_attempts",
                "Must be at least 1",
            ));
        }
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(invalid("server.port", "Port must be non-zero"));
        }

        let auth = &self.server.auth;
        if auth.enabled && auth.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::MissingField("server.auth.api_key".to_string()));
        }

        if self.environment.is_production() && !auth.enabled {
            tracing::warn!("Authentication disabled in production environment");
        }

        Ok(())
    }

    fn validate_llm(&self) -> Result<(), ConfigError> {
        let llm = &self.llm;

        if !(0.0..=2.0).contains(&llm.temperature) {
            return Err(invalid(
                "llm.temperature",
                format!("Must be between 0.0 and 2.0, got {}", llm.temperature),
            ));
        }

        if llm.max_attempts == 0 || llm.max_attempts > 10 {
            return Err(invalid(
                "llm.max_attempts",
                format!("Must be between 1 and 10, got {}", llm.max_attempts),
            ));
        }

        if llm.timeout_secs == 0 {
            return Err(invalid("llm.timeout_secs", "Timeout must be non-zero"));
        }

        match llm.provider {
            LlmProvider::Azure if llm.endpoint.is_empty() => {
                return Err(ConfigError::MissingField("llm.endpoint".to_string()));
            }
            LlmProvider::OpenAI | LlmProvider::Azure
                if self.environment.is_strict() && llm.api_key.is_none() =>
            {
                return Err(ConfigError::MissingField("llm.api_key".to_string()));
            }
            _ => {}
        }

        Ok(())
    }

    fn validate_session(&self) -> Result<(), ConfigError> {
        let session = &self.session;

        if session.inactivity_timeout_secs == 0 {
            return Err(invalid(
                "session.inactivity_timeout_secs",
                "Timeout must be non-zero",
            ));
        }
        if session.sweep_interval_secs == 0 || session.cleanup_interval_secs == 0 {
            return Err(invalid(
                "session.sweep_interval_secs",
                "Sweep and cleanup intervals must be non-zero",
            ));
        }
        if session.ttl_secs < session.inactivity_timeout_secs {
            return Err(invalid(
                "session.ttl_secs",
                format!(
                    "TTL ({}) must not be shorter than the inactivity timeout ({})",
                    session.ttl_secs, session.inactivity_timeout_secs
                ),
            ));
        }
        if session.max_sessions == 0 {
            return Err(invalid("session.max_sessions", "Must allow at least one session"));
        }

        Ok(())
    }

    fn validate_qualification(&self) -> Result<(), ConfigError> {
        let q = &self.qualification;

        let ordered = q.hot_threshold >= q.warm_threshold
            && q.warm_threshold >= q.qualified_threshold
            && q.qualified_threshold >= q.viable_threshold;
        if !ordered || q.hot_threshold > 100 {
            return Err(invalid(
                "qualification",
                "Tier thresholds must satisfy 100 >= hot >= warm >= qualified >= viable",
            ));
        }

        if q.contact_prompt_interval == 0 {
            return Err(invalid(
                "qualification.contact_prompt_interval",
                "Must be at least 1",
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins; empty means any
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    120
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_request_timeout(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            auth: AuthConfig::default(),
        }
    }
}

/// Bearer-token authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Set via LEAD_AGENT__SERVER__AUTH__API_KEY
    #[serde(default)]
    pub api_key: Option<String>,

    /// Paths that bypass authentication
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
}

fn default_public_paths() -> Vec<String> {
    vec!["/health".to_string(), "/metrics".to_string()]
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            public_paths: default_public_paths(),
        }
    }
}

/// Which chat-completion backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[serde(rename = "openai")]
    OpenAI,
    Azure,
    /// No network; asks for the next missing field
    #[default]
    Offline,
}

/// Language model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,

    /// Base URL; for Azure the resource endpoint
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_api_key")]
    pub api_key: Option<String>,

    /// Model name, or deployment name for Azure
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Total attempts per request, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles after each retry
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,
}

fn default_llm_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_api_key() -> Option<String> {
    std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty())
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_api_version() -> String {
    "2024-02-15-preview".to_string()
}
fn default_max_tokens() -> u32 {
    500
}
fn default_temperature() -> f32 {
    0.7
}
fn default_llm_timeout() -> u64 {
    30
}
fn default_max_attempts() -> u32 {
    3
}
fn default_initial_backoff() -> u64 {
    500
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            endpoint: default_llm_endpoint(),
            api_key: default_api_key(),
            model: default_model(),
            api_version: default_api_version(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
        }
    }
}

impl LlmConfig {
    /// Worst-case wall time of one request including every retry and backoff
    pub fn retry_budget(&self) -> Duration {
        let attempts = self.max_attempts.max(1);
        let backoff_ms = (0..attempts - 1)
            .map(|retry| self.initial_backoff_ms.saturating_mul(1 << retry.min(16)))
            .fold(0u64, u64::saturating_add);
        Duration::from_secs(self.timeout_secs.saturating_mul(u64::from(attempts)))
            + Duration::from_millis(backoff_ms)
    }
}

/// Session lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Idle time before a session is finalized
    #[serde(default = "default_inactivity_timeout")]
    pub inactivity_timeout_secs: u64,

    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,

    /// Maximum session age before eviction
    #[serde(default = "default_retention")]
    pub retention_secs: u64,

    /// Idle time before eviction
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,

    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_inactivity_timeout() -> u64 {
    300
}
fn default_sweep_interval() -> u64 {
    60
}
fn default_cleanup_interval() -> u64 {
    3600
}
fn default_retention() -> u64 {
    86_400
}
fn default_ttl() -> u64 {
    1800
}
fn default_max_sessions() -> usize {
    1000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout_secs: default_inactivity_timeout(),
            sweep_interval_secs: default_sweep_interval(),
            cleanup_interval_secs: default_cleanup_interval(),
            retention_secs: default_retention(),
            ttl_secs: default_ttl(),
            max_sessions: default_max_sessions(),
        }
    }
}

/// Readiness gate, scoring and routing thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualificationConfig {
    /// Substantive user turns required by the readiness gate
    #[serde(default = "default_min_substantive_turns")]
    pub min_substantive_turns: usize,

    /// User turns after which a sign-off also passes the gate
    #[serde(default = "default_signoff_min_turns")]
    pub signoff_min_turns: usize,

    /// Minimum total score for `is_qualified`
    #[serde(default = "default_qualified_score")]
    pub qualified_score: u32,

    #[serde(default = "default_hot")]
    pub hot_threshold: u32,
    #[serde(default = "default_warm")]
    pub warm_threshold: u32,
    #[serde(default = "default_qualified_tier")]
    pub qualified_threshold: u32,
    #[serde(default = "default_viable")]
    pub viable_threshold: u32,

    /// User turns between contact-form prompts
    #[serde(default = "default_contact_prompt_interval")]
    pub contact_prompt_interval: usize,

    /// Maximum stage executions per turn
    #[serde(default = "default_max_steps")]
    pub max_steps_per_turn: usize,
}

fn default_min_substantive_turns() -> usize {
    6
}
fn default_signoff_min_turns() -> usize {
    8
}
fn default_qualified_score() -> u32 {
    30
}
fn default_hot() -> u32 {
    80
}
fn default_warm() -> u32 {
    60
}
fn default_qualified_tier() -> u32 {
    45
}
fn default_viable() -> u32 {
    30
}
fn default_contact_prompt_interval() -> usize {
    3
}
fn default_max_steps() -> usize {
    16
}

impl Default for QualificationConfig {
    fn default() -> Self {
        Self {
            min_substantive_turns: default_min_substantive_turns(),
            signoff_min_turns: default_signoff_min_turns(),
            qualified_score: default_qualified_score(),
            hot_threshold: default_hot(),
            warm_threshold: default_warm(),
            qualified_threshold: default_qualified_tier(),
            viable_threshold: default_viable(),
            contact_prompt_interval: default_contact_prompt_interval(),
            max_steps_per_turn: default_max_steps(),
        }
    }
}

/// Lead hand-off configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// POST qualified leads here; log only when unset
    #[serde(default)]
    pub webhook_url: Option<String>,

    #[serde(default = "default_webhook_timeout")]
    pub webhook_timeout_secs: u64,

    /// Failed hand-offs per channel before an idle session is closed anyway
    #[serde(default = "default_delivery_attempts")]
    pub max_delivery_attempts: usize,
}

fn default_webhook_timeout() -> u64 {
    10
}
fn default_delivery_attempts() -> usize {
    3
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            webhook_timeout_secs: default_webhook_timeout(),
            max_delivery_attempts: default_delivery_attempts(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Load settings from `config/` in the working directory
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Load settings from a config directory
///
/// Sources, later overriding earlier: `{dir}/default`, `{dir}/{env}`,
/// `LEAD_AGENT__*` environment variables.
pub fn load_settings_from(dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    let default_path = dir.join("default");
    builder = builder.add_source(File::with_name(&default_path.to_string_lossy()).required(false));

    if let Some(env_name) = env {
        let env_path = dir.join(env_name);
        builder = builder.add_source(File::with_name(&env_path.to_string_lossy()).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("LEAD_AGENT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
