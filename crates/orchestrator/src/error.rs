//! Orchestrator errors

use lead_agent_core::StageId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Stage {stage} failed: {message}")]
    Stage { stage: StageId, message: String },

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Session {0} is closed")]
    SessionClosed(String),

    #[error("Step limit of {0} reached")]
    StepLimit(usize),

    #[error("Timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OrchestratorError {
    pub fn stage(stage: StageId, message: impl Into<String>) -> Self {
        OrchestratorError::Stage {
            stage,
            message: message.into(),
        }
    }
}

impl From<lead_agent_core::Error> for OrchestratorError {
    fn from(err: lead_agent_core::Error) -> Self {
        match err {
            lead_agent_core::Error::Llm(msg) => OrchestratorError::Llm(msg),
            lead_agent_core::Error::Notification(msg) | lead_agent_core::Error::Nurture(msg) => {
                OrchestratorError::Notification(msg)
            }
            lead_agent_core::Error::Timeout => OrchestratorError::Timeout,
            other => OrchestratorError::Internal(other.to_string()),
        }
    }
}

impl From<lead_agent_llm::LlmError> for OrchestratorError {
    fn from(err: lead_agent_llm::LlmError) -> Self {
        match err {
            lead_agent_llm::LlmError::Timeout => OrchestratorError::Timeout,
            other => OrchestratorError::Llm(other.to_string()),
        }
    }
}

impl From<OrchestratorError> for lead_agent_core::Error {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::Llm(msg) => lead_agent_core::Error::Llm(msg),
            OrchestratorError::Notification(msg) => lead_agent_core::Error::Notification(msg),
            OrchestratorError::Timeout => lead_agent_core::Error::Timeout,
            other => lead_agent_core::Error::InvalidState(other.to_string()),
        }
    }
}
