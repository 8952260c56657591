//! Lead hand-off traits

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ConversationState, CustomerInfo, Qualification, Recommendation, Result};

/// Payload handed to notifiers and nurture schedulers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadNotification {
    pub session_id: String,
    pub customer_info: CustomerInfo,
    pub qualification: Option<Qualification>,
    pub recommendation: Option<Recommendation>,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
}

impl LeadNotification {
    pub fn from_state(state: &ConversationState) -> Self {
        Self {
            session_id: state.session_id.clone(),
            customer_info: state.customer_info.clone(),
            qualification: state.qualification.clone(),
            recommendation: state.recommendation.clone(),
            message_count: state.messages.len(),
            created_at: Utc::now(),
        }
    }
}

/// Delivers qualified leads to the sales team
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Send a qualified-lead notification; returns a short delivery detail
    async fn notify(&self, lead: &LeadNotification) -> Result<String>;

    fn name(&self) -> &str;
}

/// Enrols unqualified leads in a nurture sequence
#[async_trait]
pub trait NurtureScheduler: Send + Sync + 'static {
    /// Enrol the lead; returns a short enrolment detail
    async fn enroll(&self, lead: &LeadNotification) -> Result<String>;

    fn name(&self) -> &str;
}
