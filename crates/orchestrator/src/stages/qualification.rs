//! Qualification stage: score the lead once

use async_trait::async_trait;
use lead_agent_core::{
    ConversationState, ConversationStatus, CustomerInfo, MergePolicy, StageId, StateUpdate,
};

use super::{Stage, StageOutput};
use crate::scoring::{opportunity_summary, LeadScorer};
use crate::OrchestratorError;

pub struct QualificationStage {
    scorer: LeadScorer,
}

impl QualificationStage {
    pub fn new(scorer: LeadScorer) -> Self {
        Self { scorer }
    }
}

#[async_trait]
impl Stage for QualificationStage {
    fn id(&self) -> StageId {
        StageId::Qualification
    }

    async fn run(&self, state: &ConversationState) -> Result<StageOutput, OrchestratorError> {
        if state.qualification.is_some() {
            return Ok(StageOutput::skipped("already qualified"));
        }

        let qualification = self.scorer.score(&state.customer_info);
        let summary = opportunity_summary(&state.customer_info, &qualification);

        tracing::info!(
            session_id = %state.session_id,
            total_score = qualification.total_score,
            tier = %qualification.tier,
            is_qualified = qualification.is_qualified,
            "Lead scored"
        );
        if qualification.is_qualified {
            metrics::counter!(
                "lead_agent_leads_qualified_total",
                "tier" => qualification.tier.as_str()
            )
            .increment(1);
        }

        let result = serde_json::json!({
            "total_score": qualification.total_score,
            "tier": qualification.tier.as_str(),
            "is_qualified": qualification.is_qualified,
        });

        let patch = CustomerInfo {
            opportunity_summary: Some(summary),
            ..Default::default()
        };
        let mut update = StateUpdate::new().with_customer_info(patch, MergePolicy::FillEmpty);
        if qualification.is_qualified {
            update = update.with_status(ConversationStatus::Qualified);
        }
        update = update.with_qualification(qualification);

        Ok(StageOutput::new(update).with_result(result))
    }
}
