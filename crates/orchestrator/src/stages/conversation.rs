//! Conversation stage: one model reply per user turn

use std::sync::Arc;

use async_trait::async_trait;
use lead_agent_core::{
    ChatMessage, ConversationState, ConversationStatus, LanguageModel, MergePolicy, StageId,
    StateUpdate,
};
use lead_agent_llm::{parse_model_reply, PromptBuilder};

use super::{Stage, StageOutput};
use crate::gate::ReadinessGate;
use crate::OrchestratorError;

pub struct ConversationStage {
    llm: Arc<dyn LanguageModel>,
    prompts: PromptBuilder,
    gate: ReadinessGate,
}

impl ConversationStage {
    pub fn new(llm: Arc<dyn LanguageModel>, prompts: PromptBuilder, gate: ReadinessGate) -> Self {
        Self { llm, prompts, gate }
    }
}

#[async_trait]
impl Stage for ConversationStage {
    fn id(&self) -> StageId {
        StageId::Conversation
    }

    async fn run(&self, state: &ConversationState) -> Result<StageOutput, OrchestratorError> {
        let request = self
            .prompts
            .build_request(&state.messages, &state.customer_info);
        let response = self.llm.generate(request).await?;
        let reply = parse_model_reply(&response.text);

        if reply.response.is_empty() {
            return Err(OrchestratorError::stage(
                StageId::Conversation,
                "model returned an empty reply",
            ));
        }
        if !reply.structured {
            tracing::debug!(
                session_id = %state.session_id,
                "Model reply was not structured, using it as plain text"
            );
        }

        let mut projected = state.customer_info.clone();
        projected.merge(&reply.customer_info, MergePolicy::Refine);

        // Only the gathering statuses are decided here
        let requested = reply.status.unwrap_or(ConversationStatus::Active);
        let status = match state.conversation_status {
            ConversationStatus::Active | ConversationStatus::ReadyToQualify => {
                if requested == ConversationStatus::Active {
                    Some(ConversationStatus::Active)
                } else {
                    let decision = self.gate.evaluate(&projected, &state.messages);
                    if decision.ready {
                        Some(ConversationStatus::ReadyToQualify)
                    } else {
                        tracing::info!(
                            session_id = %state.session_id,
                            requested = %requested,
                            missing = ?decision.missing,
                            substantive_turns = decision.substantive_turns,
                            "Readiness gate not met, keeping conversation active"
                        );
                        Some(ConversationStatus::Active)
                    }
                }
            }
            _ => None,
        };

        let mut update = StateUpdate::new().with_message(ChatMessage::assistant(&reply.response));
        if !reply.customer_info.is_empty() {
            update = update.with_customer_info(reply.customer_info, MergePolicy::Refine);
        }
        if let Some(status) = status {
            update = update.with_status(status);
        }

        let result = serde_json::json!({
            "model": self.llm.model_name(),
            "structured": reply.structured,
            "requested_status": reply.status.map(|s| s.as_str()),
            "status": status.map(|s| s.as_str()),
        });

        Ok(StageOutput::new(update)
            .with_result(result)
            .with_retries(response.retries))
    }
}
