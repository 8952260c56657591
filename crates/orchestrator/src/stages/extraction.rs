//! Extraction stage: rule-based profile patch from the latest user message

use async_trait::async_trait;
use lead_agent_core::{
    ConversationState, ConversationStatus, CustomerInfo, MergePolicy, StageId, StateUpdate,
};
use lead_agent_text_processing::CustomerInfoExtractor;

use super::{Stage, StageOutput};
use crate::gate::ReadinessGate;
use crate::OrchestratorError;

pub struct ExtractionStage {
    extractor: CustomerInfoExtractor,
    gate: ReadinessGate,
}

impl ExtractionStage {
    pub fn new(gate: ReadinessGate) -> Self {
        Self {
            extractor: CustomerInfoExtractor::new(),
            gate,
        }
    }
}

#[async_trait]
impl Stage for ExtractionStage {
    fn id(&self) -> StageId {
        StageId::Extraction
    }

    async fn run(&self, state: &ConversationState) -> Result<StageOutput, OrchestratorError> {
        let Some(message) = state.latest_user_message() else {
            return Ok(StageOutput::skipped("no user message"));
        };

        let patch = self.extractor.extract(&message.content);
        let fields = populated_fields(&patch);

        let mut projected = state.customer_info.clone();
        let changed = projected.merge(&patch, MergePolicy::FillEmpty);

        let mut update = StateUpdate::new();
        if changed {
            update = update.with_customer_info(patch, MergePolicy::FillEmpty);
        }

        // Information may have arrived without the model noticing
        let promoted = state.conversation_status == ConversationStatus::Active
            && self.gate.evaluate(&projected, &state.messages).ready;
        if promoted {
            tracing::info!(session_id = %state.session_id, "Readiness gate passed after extraction");
            update = update.with_status(ConversationStatus::ReadyToQualify);
        }

        Ok(StageOutput::new(update).with_result(serde_json::json!({
            "fields": fields,
            "changed": changed,
            "promoted": promoted,
        })))
    }
}

fn populated_fields(info: &CustomerInfo) -> Vec<&'static str> {
    [
        ("name", info.name.is_some()),
        ("email", info.email.is_some()),
        ("phone", info.phone.is_some()),
        ("company", info.company.is_some()),
        ("industry", info.industry.is_some()),
        ("employee_count", info.employee_count.is_some()),
        ("title", info.title.is_some()),
        ("challenges", !info.current_challenges.is_empty()),
        ("budget", info.budget.is_some()),
        ("timeline", info.timeline.is_some()),
        ("intent_type", info.intent_type.is_some()),
    ]
    .into_iter()
    .filter_map(|(field, present)| present.then_some(field))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lead_agent_core::ChatMessage;

    #[tokio::test]
    async fn test_extraction_is_idempotent() {
        let stage = ExtractionStage::new(ReadinessGate::default());
        let mut state = ConversationState::new("s1");
        state.apply(StateUpdate::new().with_message(ChatMessage::user(
            "I'm Dana Lee from Northwind Mutual, email dana@northwind.io",
        )));

        let first = stage.run(&state).await.unwrap();
        state.apply(first.update);
        let after_first = state.customer_info.clone();
        assert_eq!(after_first.email.as_deref(), Some("dana@northwind.io"));

        let second = stage.run(&state).await.unwrap();
        assert!(second.update.customer_info.is_none());
        state.apply(second.update);
        assert_eq!(state.customer_info, after_first);
    }

    #[tokio::test]
    async fn test_skips_without_user_message() {
        let stage = ExtractionStage::new(ReadinessGate::default());
        let output = stage.run(&ConversationState::new("s1")).await.unwrap();
        assert!(output.update.customer_info.is_none());
        assert!(output.update.status.is_none());
    }
}
