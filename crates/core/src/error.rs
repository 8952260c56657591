//! Error types shared across crates

use thiserror::Error;

/// Result alias using the core error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error
///
/// Subsystem crates define their own error enums and convert into this one
/// at trait boundaries so `?` works across crate lines.
#[derive(Error, Debug)]
pub enum Error {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Nurture error: {0}")]
    Nurture(String),

    #[error("Analytics error: {0}")]
    Analytics(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Timeout")]
    Timeout,
}
