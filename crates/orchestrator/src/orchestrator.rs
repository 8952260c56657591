//! Lead orchestrator
//!
//! Runs the stage graph for one user turn, and finalizes sessions that went
//! idle. Callers own the `ConversationState` and must serialize access to it
//! per session.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use lead_agent_config::{LlmConfig, QualificationConfig};
use lead_agent_core::{
    AgentExecution, AnalyticsProvider, ChatMessage, ConversationState, ConversationStatus,
    CustomerInfo, ErrorRecord, ExecutionStatus, LanguageModel, Notifier, NurtureScheduler,
    Qualification, RecommendationProvider, StageId, StateUpdate, UiAction,
};
use lead_agent_llm::PromptBuilder;
use serde::Serialize;

use crate::delivery::{LogNotifier, LogNurtureScheduler};
use crate::gate::ReadinessGate;
use crate::graph::{delivery_route, Router};
use crate::insights::{HeuristicAnalytics, RuleBasedRecommender};
use crate::scoring::LeadScorer;
use crate::stages::{
    ConversationStage, ErrorRecoveryStage, ExtractionStage, NotificationStage, NurtureStage,
    ParallelProcessingStage, QualificationStage, Stage, UiInteractionStage,
};
use crate::OrchestratorError;

/// Result of one user turn
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub session_id: String,
    /// Assistant reply for this turn
    pub response: String,
    pub status: ConversationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui_action: Option<UiAction>,
    pub customer_info: CustomerInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualification: Option<Qualification>,
    /// Stages executed, in order
    pub stages: Vec<StageId>,
}

/// How an idle session was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionDisposition {
    /// Not enough information to act on; discard
    Abandoned,
    /// Routed through qualification and delivery
    Completed,
    /// Hand-off failed; left open so a later sweep retries it
    Pending,
}

impl SessionDisposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionDisposition::Abandoned => "abandoned",
            SessionDisposition::Completed => "completed",
            SessionDisposition::Pending => "pending",
        }
    }
}

#[derive(Debug, Default)]
struct TurnTrace {
    stages: Vec<StageId>,
    ui_action: Option<UiAction>,
}

pub struct LeadOrchestrator {
    conversation: ConversationStage,
    extraction: ExtractionStage,
    ui_interaction: UiInteractionStage,
    qualification: QualificationStage,
    parallel: ParallelProcessingStage,
    notification: NotificationStage,
    nurture: NurtureStage,
    error_recovery: ErrorRecoveryStage,
    router: Router,
    max_steps: usize,
}

impl LeadOrchestrator {
    /// Create with log delivery and the built-in insight providers
    pub fn new(llm: Arc<dyn LanguageModel>, config: &QualificationConfig) -> Self {
        Self::with_prompts(llm, PromptBuilder::default(), config)
    }

    /// Create with prompt limits taken from the LLM settings
    pub fn from_settings(
        llm: Arc<dyn LanguageModel>,
        llm_config: &LlmConfig,
        config: &QualificationConfig,
    ) -> Self {
        let prompts = PromptBuilder::new(llm_config.max_tokens, llm_config.temperature);
        Self::with_prompts(llm, prompts, config)
    }

    fn with_prompts(
        llm: Arc<dyn LanguageModel>,
        prompts: PromptBuilder,
        config: &QualificationConfig,
    ) -> Self {
        let gate = ReadinessGate::from_config(config);
        Self {
            conversation: ConversationStage::new(llm, prompts, gate),
            extraction: ExtractionStage::new(gate),
            ui_interaction: UiInteractionStage,
            qualification: QualificationStage::new(LeadScorer::from_config(config)),
            parallel: ParallelProcessingStage::new(
                Arc::new(HeuristicAnalytics),
                Arc::new(RuleBasedRecommender),
            ),
            notification: NotificationStage::new(Arc::new(LogNotifier)),
            nurture: NurtureStage::new(Arc::new(LogNurtureScheduler)),
            error_recovery: ErrorRecoveryStage,
            router: Router::new(config.contact_prompt_interval),
            max_steps: config.max_steps_per_turn.max(1),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notification = NotificationStage::new(notifier);
        self
    }

    pub fn with_nurture(mut self, scheduler: Arc<dyn NurtureScheduler>) -> Self {
        self.nurture = NurtureStage::new(scheduler);
        self
    }

    /// Failed hand-offs tolerated per channel before a session is closed anyway
    pub fn with_delivery_attempts(mut self, attempts: usize) -> Self {
        self.router = self.router.with_delivery_attempts(attempts);
        self
    }

    pub fn with_insights(
        mut self,
        analytics: Arc<dyn AnalyticsProvider>,
        recommender: Arc<dyn RecommendationProvider>,
    ) -> Self {
        self.parallel = ParallelProcessingStage::new(analytics, recommender);
        self
    }

    fn stage(&self, id: StageId) -> &dyn Stage {
        match id {
            StageId::Conversation => &self.conversation,
            StageId::Extraction => &self.extraction,
            StageId::UiInteraction => &self.ui_interaction,
            StageId::Qualification => &self.qualification,
            StageId::ParallelProcessing => &self.parallel,
            StageId::Notification => &self.notification,
            StageId::Nurture => &self.nurture,
            StageId::ErrorRecovery => &self.error_recovery,
        }
    }

    /// Process one user message
    ///
    /// Stage failures never surface here; they are recorded on the state and
    /// answered by error recovery. Errors are only returned for input the
    /// session cannot accept.
    pub async fn process_message(
        &self,
        state: &mut ConversationState,
        text: &str,
    ) -> Result<TurnOutcome, OrchestratorError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(OrchestratorError::InvalidInput(
                "message must not be empty".to_string(),
            ));
        }
        if state.conversation_status.is_closed() {
            return Err(OrchestratorError::SessionClosed(state.session_id.clone()));
        }

        let started = Instant::now();
        let turn_start = state.messages.len();
        state.apply(StateUpdate::new().with_message(ChatMessage::user(text)));

        let mut trace = TurnTrace::default();
        self.run_graph(state, StageId::Conversation, &mut trace).await;

        let response = state.messages[turn_start..]
            .iter()
            .rev()
            .find(|m| !m.is_user())
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let elapsed = started.elapsed();
        metrics::counter!("lead_agent_turns_total").increment(1);
        metrics::histogram!("lead_agent_turn_duration_seconds").record(elapsed.as_secs_f64());
        tracing::debug!(
            session_id = %state.session_id,
            status = %state.conversation_status,
            stages = ?trace.stages,
            elapsed_ms = elapsed.as_millis() as u64,
            "Turn complete"
        );

        Ok(TurnOutcome {
            session_id: state.session_id.clone(),
            response,
            status: state.conversation_status,
            ui_action: trace.ui_action,
            customer_info: state.customer_info.clone(),
            qualification: state.qualification.clone(),
            stages: trace.stages,
        })
    }

    /// Close a session that went idle
    ///
    /// Sessions without contact details or business context are abandoned.
    /// Everything else is scored if needed and delivered to sales or nurture.
    /// A failed hand-off leaves the session open as `Pending` until the
    /// delivery attempts run out.
    pub async fn finalize_inactive(&self, state: &mut ConversationState) -> SessionDisposition {
        match state.conversation_status {
            ConversationStatus::Completed => return SessionDisposition::Completed,
            ConversationStatus::Abandoned => return SessionDisposition::Abandoned,
            _ => {}
        }

        let info = &state.customer_info;
        if !info.has_contact() || !info.has_business_context() {
            tracing::info!(
                session_id = %state.session_id,
                has_contact = info.has_contact(),
                has_business_context = info.has_business_context(),
                "Abandoning idle session"
            );
            state.apply(StateUpdate::new().with_status(ConversationStatus::Abandoned));
            metrics::counter!("lead_agent_sessions_finalized_total", "outcome" => "abandoned")
                .increment(1);
            return SessionDisposition::Abandoned;
        }

        let entry = if state.qualification.is_none() {
            Some(StageId::Qualification)
        } else {
            self.router.delivery(state)
        };
        if let Some(entry) = entry {
            let mut trace = TurnTrace::default();
            self.run_graph(state, entry, &mut trace).await;
        }

        if self.router.delivery(state).is_some() {
            tracing::warn!(
                session_id = %state.session_id,
                errors = state.errors.len(),
                "Lead hand-off failed; session left open for retry"
            );
            metrics::counter!("lead_agent_sessions_finalized_total", "outcome" => "pending")
                .increment(1);
            return SessionDisposition::Pending;
        }
        if let Some(stage) = delivery_route(state) {
            tracing::error!(
                session_id = %state.session_id,
                stage = %stage,
                "Lead hand-off attempts exhausted; closing without delivery"
            );
        }

        state.apply(StateUpdate::new().with_status(ConversationStatus::Completed));
        tracing::info!(
            session_id = %state.session_id,
            qualified = state.is_qualified(),
            notifications = state.notifications_sent.len(),
            "Completed idle session"
        );
        metrics::counter!("lead_agent_sessions_finalized_total", "outcome" => "completed")
            .increment(1);
        SessionDisposition::Completed
    }

    async fn run_graph(&self, state: &mut ConversationState, entry: StageId, trace: &mut TurnTrace) {
        let mut current = Some(entry);
        let mut steps = 0;

        while let Some(id) = current {
            if steps >= self.max_steps {
                let error = OrchestratorError::StepLimit(self.max_steps);
                tracing::error!(session_id = %state.session_id, stage = %id, "{}", error);
                state.apply(StateUpdate::new().with_error(ErrorRecord {
                    timestamp: Utc::now(),
                    agent: id,
                    error: error.to_string(),
                    recovered: true,
                }));
                break;
            }
            steps += 1;
            trace.stages.push(id);

            let start_time = Utc::now();
            let result = self.stage(id).run(state).await;
            let end_time = Utc::now();

            let failed = match result {
                Ok(output) => {
                    let execution = AgentExecution {
                        agent_id: id,
                        start_time,
                        end_time,
                        status: ExecutionStatus::Success,
                        result: output.result,
                        error: None,
                        retry_count: output.retries,
                    };
                    if output.update.ui_action.is_some() {
                        trace.ui_action = output.update.ui_action;
                    }
                    state.apply(output.update.with_execution(execution));
                    false
                }
                Err(e) => {
                    tracing::warn!(session_id = %state.session_id, stage = %id, error = %e, "Stage failed");
                    metrics::counter!("lead_agent_stage_errors_total", "stage" => id.as_str())
                        .increment(1);
                    let execution = AgentExecution {
                        agent_id: id,
                        start_time,
                        end_time,
                        status: ExecutionStatus::Failed,
                        result: None,
                        error: Some(e.to_string()),
                        retry_count: 0,
                    };
                    state.apply(
                        StateUpdate::new()
                            .with_execution(execution)
                            .with_error(ErrorRecord {
                                timestamp: end_time,
                                agent: id,
                                error: e.to_string(),
                                recovered: false,
                            }),
                    );
                    true
                }
            };

            current = self.router.next(id, state, failed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lead_agent_llm::OfflineBackend;

    fn orchestrator() -> LeadOrchestrator {
        LeadOrchestrator::new(Arc::new(OfflineBackend::new()), &QualificationConfig::default())
    }

    #[tokio::test]
    async fn test_rejects_empty_message() {
        let mut state = ConversationState::new("s1");
        let result = orchestrator().process_message(&mut state, "   ").await;
        assert!(matches!(result, Err(OrchestratorError::InvalidInput(_))));
        assert!(state.messages.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_closed_session() {
        let mut state = ConversationState::new("s1");
        state.conversation_status = ConversationStatus::Abandoned;
        let result = orchestrator().process_message(&mut state, "hello").await;
        assert!(matches!(result, Err(OrchestratorError::SessionClosed(_))));
    }

    #[tokio::test]
    async fn test_offline_turn() {
        let mut state = ConversationState::new("s1");
        let outcome = orchestrator()
            .process_message(&mut state, "Hi, I'm Dana Lee from Northwind Mutual")
            .await
            .unwrap();

        assert!(!outcome.response.is_empty());
        assert_eq!(outcome.status, ConversationStatus::Active);
        assert_eq!(
            outcome.stages,
            vec![
                StageId::Conversation,
                StageId::Extraction,
                StageId::ParallelProcessing
            ]
        );
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.agent_executions.len(), 3);
    }

    #[tokio::test]
    async fn test_analytics_refresh_every_turn() {
        let orchestrator = orchestrator();
        let mut state = ConversationState::new("s1");
        for text in [
            "Hi, I'm Dana Lee from Northwind Mutual",
            "We process about 4,000 claims a month",
            "Most of it is still manual review",
        ] {
            orchestrator.process_message(&mut state, text).await.unwrap();
        }

        assert_eq!(state.analytics.message_count, 6);
        let refreshes = state
            .agent_executions
            .iter()
            .filter(|e| e.agent_id == StageId::ParallelProcessing)
            .count();
        assert_eq!(refreshes, 3);
    }

    #[tokio::test]
    async fn test_finalize_without_contact_abandons() {
        let mut state = ConversationState::new("s1");
        state.customer_info.company = Some("Northwind Mutual".into());

        let disposition = orchestrator().finalize_inactive(&mut state).await;
        assert_eq!(disposition, SessionDisposition::Abandoned);
        assert_eq!(state.conversation_status, ConversationStatus::Abandoned);
        assert!(state.notifications_sent.is_empty());
    }

    #[tokio::test]
    async fn test_finalize_contact_without_business_context_abandons() {
        let mut state = ConversationState::new("s1");
        state.customer_info.email = Some("dana@northwind.io".into());

        let disposition = orchestrator().finalize_inactive(&mut state).await;
        assert_eq!(disposition, SessionDisposition::Abandoned);
        assert_eq!(state.conversation_status, ConversationStatus::Abandoned);
        assert!(state.qualification.is_none());
        assert!(state.notifications_sent.is_empty());
    }
}
