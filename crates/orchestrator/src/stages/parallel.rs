//! Parallel processing stage: analytics and recommendation side by side

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use lead_agent_core::{
    AnalyticsProvider, ConversationState, ErrorRecord, RecommendationProvider, StageId,
    StateUpdate,
};

use super::{Stage, StageOutput};
use crate::OrchestratorError;

pub struct ParallelProcessingStage {
    analytics: Arc<dyn AnalyticsProvider>,
    recommender: Arc<dyn RecommendationProvider>,
}

impl ParallelProcessingStage {
    pub fn new(
        analytics: Arc<dyn AnalyticsProvider>,
        recommender: Arc<dyn RecommendationProvider>,
    ) -> Self {
        Self {
            analytics,
            recommender,
        }
    }
}

#[async_trait]
impl Stage for ParallelProcessingStage {
    fn id(&self) -> StageId {
        StageId::ParallelProcessing
    }

    /// A failed branch is recorded and skipped; the other branch still lands
    async fn run(&self, state: &ConversationState) -> Result<StageOutput, OrchestratorError> {
        let (analytics, recommendation) = tokio::join!(
            self.analytics.analyze(state),
            self.recommender.recommend(state)
        );

        let mut update = StateUpdate::new();
        let mut failed = Vec::new();

        match analytics {
            Ok(analytics) => update = update.with_analytics(analytics),
            Err(e) => {
                tracing::warn!(session_id = %state.session_id, error = %e, "Analytics branch failed");
                failed.push("analytics");
                update = update.with_error(branch_error(e));
            }
        }

        match recommendation {
            Ok(recommendation) => update = update.with_recommendation(recommendation),
            Err(e) => {
                tracing::warn!(session_id = %state.session_id, error = %e, "Recommendation branch failed");
                failed.push("recommendation");
                update = update.with_error(branch_error(e));
            }
        }

        Ok(StageOutput::new(update).with_result(serde_json::json!({ "failed_branches": failed })))
    }
}

fn branch_error(error: lead_agent_core::Error) -> ErrorRecord {
    ErrorRecord {
        timestamp: Utc::now(),
        agent: StageId::ParallelProcessing,
        error: error.to_string(),
        recovered: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::{HeuristicAnalytics, RuleBasedRecommender};
    use lead_agent_core::{Analytics, Result};

    struct FailingAnalytics;

    #[async_trait]
    impl AnalyticsProvider for FailingAnalytics {
        async fn analyze(&self, _state: &ConversationState) -> Result<Analytics> {
            Err(lead_agent_core::Error::Analytics("warehouse offline".into()))
        }
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_other_branch() {
        let stage = ParallelProcessingStage::new(
            Arc::new(FailingAnalytics),
            Arc::new(RuleBasedRecommender),
        );
        let mut state = ConversationState::new("s1");

        let output = stage.run(&state).await.unwrap();
        assert!(output.update.analytics.is_none());
        assert!(output.update.recommendation.is_some());
        assert_eq!(output.update.errors.len(), 1);

        state.apply(output.update);
        assert!(state.recommendation.is_some());
        assert_eq!(state.unrecovered_errors(), 0);
    }

    #[tokio::test]
    async fn test_both_branches_succeed() {
        let stage = ParallelProcessingStage::new(
            Arc::new(HeuristicAnalytics),
            Arc::new(RuleBasedRecommender),
        );
        let output = stage.run(&ConversationState::new("s1")).await.unwrap();
        assert!(output.update.analytics.is_some());
        assert!(output.update.recommendation.is_some());
        assert!(output.update.errors.is_empty());
    }
}
