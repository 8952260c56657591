//! Collaborator traits
//!
//! The orchestrator depends only on these; implementations live in the
//! llm, orchestrator and server crates.

mod delivery;
mod insights;
mod llm;

pub use delivery::{LeadNotification, Notifier, NurtureScheduler};
pub use insights::{AnalyticsProvider, RecommendationProvider};
pub use llm::LanguageModel;
