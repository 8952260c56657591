//! Notification and nurture stages
//!
//! Both are guarded by `notifications_sent`, so a session produces at most
//! one record of each kind.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use lead_agent_core::{
    ConversationState, LeadNotification, NotificationRecord, NotificationType, Notifier,
    NurtureScheduler, StageId, StateUpdate,
};

use super::{Stage, StageOutput};
use crate::OrchestratorError;

pub struct NotificationStage {
    notifier: Arc<dyn Notifier>,
}

impl NotificationStage {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl Stage for NotificationStage {
    fn id(&self) -> StageId {
        StageId::Notification
    }

    async fn run(&self, state: &ConversationState) -> Result<StageOutput, OrchestratorError> {
        if state.has_notification(NotificationType::Qualification) {
            return Ok(StageOutput::skipped("already notified"));
        }

        let lead = LeadNotification::from_state(state);
        let receipt = self.notifier.notify(&lead).await?;

        tracing::info!(
            session_id = %state.session_id,
            notifier = self.notifier.name(),
            receipt = %receipt,
            "Sales team notified of qualified lead"
        );
        metrics::counter!("lead_agent_notifications_total", "type" => "qualification")
            .increment(1);

        Ok(deliver(NotificationType::Qualification, self.notifier.name(), receipt))
    }
}

pub struct NurtureStage {
    scheduler: Arc<dyn NurtureScheduler>,
}

impl NurtureStage {
    pub fn new(scheduler: Arc<dyn NurtureScheduler>) -> Self {
        Self { scheduler }
    }
}

#[async_trait]
impl Stage for NurtureStage {
    fn id(&self) -> StageId {
        StageId::Nurture
    }

    async fn run(&self, state: &ConversationState) -> Result<StageOutput, OrchestratorError> {
        if state.has_notification(NotificationType::Nurture) {
            return Ok(StageOutput::skipped("already enrolled"));
        }

        let lead = LeadNotification::from_state(state);
        let receipt = self.scheduler.enroll(&lead).await?;

        tracing::info!(
            session_id = %state.session_id,
            scheduler = self.scheduler.name(),
            receipt = %receipt,
            "Lead enrolled in nurture sequence"
        );
        metrics::counter!("lead_agent_notifications_total", "type" => "nurture").increment(1);

        Ok(deliver(NotificationType::Nurture, self.scheduler.name(), receipt))
    }
}

fn deliver(kind: NotificationType, channel: &str, receipt: String) -> StageOutput {
    let record = NotificationRecord {
        notification_type: kind,
        timestamp: Utc::now(),
        detail: receipt.clone(),
    };
    StageOutput::new(StateUpdate::new().with_notification(record)).with_result(
        serde_json::json!({
            "channel": channel,
            "receipt": receipt,
        }),
    )
}
