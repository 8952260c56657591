//! Per-session conversation state and the reducer that merges stage updates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conversation::{ChatMessage, ConversationStatus};
use crate::customer::{CustomerInfo, MergePolicy};
use crate::qualification::Qualification;

/// Graph stage identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    Conversation,
    Extraction,
    UiInteraction,
    Qualification,
    ParallelProcessing,
    Notification,
    Nurture,
    ErrorRecovery,
}

impl StageId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::Conversation => "conversation",
            StageId::Extraction => "extraction",
            StageId::UiInteraction => "ui_interaction",
            StageId::Qualification => "qualification",
            StageId::ParallelProcessing => "parallel_processing",
            StageId::Notification => "notification",
            StageId::Nurture => "nurture",
            StageId::ErrorRecovery => "error_recovery",
        }
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    Failed,
}

/// Record of a single stage invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentExecution {
    pub agent_id: StageId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: ExecutionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub retry_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub timestamp: DateTime<Utc>,
    pub agent: StageId,
    pub error: String,
    pub recovered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Qualification,
    Nurture,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub timestamp: DateTime<Utc>,
    pub detail: String,
}

/// Conversation metrics, recomputed every turn
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    pub message_count: usize,
    pub conversation_duration_secs: i64,
    pub conversion_probability: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    ScheduleDemo,
    SendPricing,
    TechnicalDeepDive,
    NurtureSequence,
    ContinueDiscovery,
}

/// Suggested next step for the sales team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: RecommendedAction,
    pub rationale: String,
    pub talking_points: Vec<String>,
}

/// Instruction for the client UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiAction {
    /// Show the contact capture form
    RequestContact,
}

/// Partial update returned by a stage
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub messages: Vec<ChatMessage>,
    pub customer_info: Option<CustomerInfo>,
    pub merge_policy: MergePolicy,
    pub status: Option<ConversationStatus>,
    pub qualification: Option<Qualification>,
    pub executions: Vec<AgentExecution>,
    pub errors: Vec<ErrorRecord>,
    pub notifications: Vec<NotificationRecord>,
    pub analytics: Option<Analytics>,
    pub recommendation: Option<Recommendation>,
    pub ui_action: Option<UiAction>,
    pub contact_prompt_turn: Option<usize>,
    /// Mark every outstanding error as recovered
    pub recover_errors: bool,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_customer_info(mut self, info: CustomerInfo, policy: MergePolicy) -> Self {
        self.customer_info = Some(info);
        self.merge_policy = policy;
        self
    }

    pub fn with_status(mut self, status: ConversationStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_qualification(mut self, qualification: Qualification) -> Self {
        self.qualification = Some(qualification);
        self
    }

    pub fn with_execution(mut self, execution: AgentExecution) -> Self {
        self.executions.push(execution);
        self
    }

    pub fn with_error(mut self, error: ErrorRecord) -> Self {
        self.errors.push(error);
        self
    }

    pub fn with_notification(mut self, record: NotificationRecord) -> Self {
        self.notifications.push(record);
        self
    }

    pub fn with_analytics(mut self, analytics: Analytics) -> Self {
        self.analytics = Some(analytics);
        self
    }

    pub fn with_recommendation(mut self, recommendation: Recommendation) -> Self {
        self.recommendation = Some(recommendation);
        self
    }

    pub fn with_ui_action(mut self, action: UiAction) -> Self {
        self.ui_action = Some(action);
        self
    }
}

/// Complete state of one qualification conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub session_id: String,
    pub messages: Vec<ChatMessage>,
    pub customer_info: CustomerInfo,
    pub qualification: Option<Qualification>,
    pub conversation_status: ConversationStatus,
    pub agent_executions: Vec<AgentExecution>,
    pub errors: Vec<ErrorRecord>,
    pub notifications_sent: Vec<NotificationRecord>,
    pub analytics: Analytics,
    pub recommendation: Option<Recommendation>,
    pub start_time: DateTime<Utc>,
    pub last_update_time: DateTime<Utc>,
    pub last_contact_prompt_turn: Option<usize>,
}

impl ConversationState {
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
            customer_info: CustomerInfo::default(),
            qualification: None,
            conversation_status: ConversationStatus::Active,
            agent_executions: Vec::new(),
            errors: Vec::new(),
            notifications_sent: Vec::new(),
            analytics: Analytics::default(),
            recommendation: None,
            start_time: now,
            last_update_time: now,
            last_contact_prompt_turn: None,
        }
    }

    /// Merge a stage update into the state
    pub fn apply(&mut self, update: StateUpdate) {
        self.messages.extend(update.messages);
        self.agent_executions.extend(update.executions);

        if update.recover_errors {
            for error in self.errors.iter_mut().filter(|e| !e.recovered) {
                error.recovered = true;
            }
        }
        self.errors.extend(update.errors);
        self.notifications_sent.extend(update.notifications);

        if let Some(info) = update.customer_info {
            self.customer_info.merge(&info, update.merge_policy);
        }

        if let Some(next) = update.status {
            if self.conversation_status.can_transition_to(next) {
                self.conversation_status = next;
            } else {
                tracing::warn!(
                    session_id = %self.session_id,
                    from = %self.conversation_status,
                    to = %next,
                    "Ignoring illegal status transition"
                );
            }
        }

        if self.qualification.is_none() {
            self.qualification = update.qualification;
        }

        if let Some(analytics) = update.analytics {
            self.analytics = analytics;
        }
        if update.recommendation.is_some() {
            self.recommendation = update.recommendation;
        }
        if update.contact_prompt_turn.is_some() {
            self.last_contact_prompt_turn = update.contact_prompt_turn;
        }

        self.last_update_time = Utc::now();
    }

    pub fn user_messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|m| m.is_user())
    }

    pub fn user_turn_count(&self) -> usize {
        self.user_messages().count()
    }

    pub fn latest_user_message(&self) -> Option<&ChatMessage> {
        self.messages.iter().rev().find(|m| m.is_user())
    }

    pub fn has_notification(&self, kind: NotificationType) -> bool {
        self.notifications_sent
            .iter()
            .any(|n| n.notification_type == kind)
    }

    pub fn unrecovered_errors(&self) -> usize {
        self.errors.iter().filter(|e| !e.recovered).count()
    }

    pub fn is_qualified(&self) -> bool {
        self.qualification
            .as_ref()
            .map(|q| q.is_qualified)
            .unwrap_or(false)
    }
}
