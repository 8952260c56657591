//! Core traits and types for the lead qualification agent
//!
//! This crate provides foundational types used across all other crates:
//! - Conversation state and the reducer that merges stage updates
//! - Customer profile with merge policies
//! - Qualification record and tiers
//! - LLM request/response types
//! - Collaborator traits (language model, notifier, nurture, insights)
//! - Error types

pub mod conversation;
pub mod customer;
pub mod error;
pub mod llm_types;
pub mod qualification;
pub mod state;
pub mod traits;

pub use conversation::{ChatMessage, ConversationStatus, MessageRole};
pub use customer::{
    BudgetRange, CompanySize, CustomerInfo, DecisionRole, IntentType, MergePolicy, Timeline,
};
pub use error::{Error, Result};
pub use llm_types::{FinishReason, GenerateRequest, GenerateResponse, Message, Role, TokenUsage};
pub use qualification::{LeadTier, Qualification, TierThresholds};
pub use state::{
    AgentExecution, Analytics, ConversationState, ErrorRecord, ExecutionStatus,
    NotificationRecord, NotificationType, Recommendation, RecommendedAction, StageId,
    StateUpdate, UiAction,
};

pub use traits::{
    AnalyticsProvider, LanguageModel, LeadNotification, Notifier, NurtureScheduler,
    RecommendationProvider,
};
