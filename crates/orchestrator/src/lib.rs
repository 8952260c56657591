//! Lead qualification orchestrator
//!
//! Features:
//! - Stage graph: conversation, extraction, contact prompt, qualification,
//!   parallel analytics/recommendation, notification or nurture
//! - Authoritative readiness gate over the model's own status signal
//! - BANT lead scoring with configurable tiers
//! - Error recovery that keeps the conversation going
//! - Idle-session finalization

pub mod delivery;
pub mod error;
pub mod gate;
pub mod graph;
pub mod insights;
pub mod orchestrator;
pub mod scoring;
pub mod stages;

pub use delivery::{LogNotifier, LogNurtureScheduler};
pub use error::OrchestratorError;
pub use gate::{GateDecision, ReadinessGate};
pub use graph::Router;
pub use insights::{HeuristicAnalytics, RuleBasedRecommender};
pub use orchestrator::{LeadOrchestrator, SessionDisposition, TurnOutcome};
pub use scoring::{opportunity_summary, LeadScorer};
pub use stages::{Stage, StageOutput, RECOVERY_MESSAGE};
