//! LLM integration for the lead qualification agent
//!
//! Features:
//! - OpenAI and Azure OpenAI chat-completion backend with retry
//! - Offline backend that asks for the next missing field
//! - Prompt building from the known customer profile
//! - Lenient parsing of structured model replies

pub mod backend;
pub mod factory;
pub mod offline;
pub mod prompt;
pub mod response;
pub mod retry;

pub use backend::{OpenAIBackend, OpenAIConfig};
pub use factory::create_language_model;
pub use offline::OfflineBackend;
pub use prompt::{PromptBuilder, STILL_NEEDED_PREFIX};
pub use response::{parse_model_reply, ModelReply};
pub use retry::RetryPolicy;

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl LlmError {
    /// Transient failures worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Network(_) | LlmError::Timeout)
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for lead_agent_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout => lead_agent_core::Error::Timeout,
            other => lead_agent_core::Error::Llm(other.to_string()),
        }
    }
}
