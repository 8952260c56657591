//! Default analytics and recommendation providers
//!
//! Both are rule-based and run without external services.

use async_trait::async_trait;
use lead_agent_core::{
    Analytics, AnalyticsProvider, ConversationState, DecisionRole, IntentType, LeadTier,
    Recommendation, RecommendationProvider, RecommendedAction, Result,
};

/// Profile fields that count toward completeness
const PROFILE_FIELDS: f32 = 6.0;

#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicAnalytics;

#[async_trait]
impl AnalyticsProvider for HeuristicAnalytics {
    async fn analyze(&self, state: &ConversationState) -> Result<Analytics> {
        let duration = (state.last_update_time - state.start_time)
            .num_seconds()
            .max(0);

        let conversion_probability = match &state.qualification {
            Some(q) if q.is_qualified => (q.total_score as f32 / 100.0).clamp(0.3, 0.95),
            Some(q) => (q.total_score as f32 / 200.0).min(0.25),
            None => {
                let known = PROFILE_FIELDS - state.customer_info.missing_fields().len() as f32;
                (known / PROFILE_FIELDS) * 0.5
            }
        };

        Ok(Analytics {
            message_count: state.messages.len(),
            conversation_duration_secs: duration,
            conversion_probability,
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RuleBasedRecommender;

#[async_trait]
impl RecommendationProvider for RuleBasedRecommender {
    async fn recommend(&self, state: &ConversationState) -> Result<Recommendation> {
        let info = &state.customer_info;
        let tier = state.qualification.as_ref().map(|q| q.tier);

        let (action, rationale) = match (state.is_qualified(), tier, info.intent_type) {
            (true, _, Some(IntentType::Integration)) => (
                RecommendedAction::TechnicalDeepDive,
                "Qualified lead asking about integration".to_string(),
            ),
            (true, Some(LeadTier::Hot | LeadTier::Warm), _) => (
                RecommendedAction::ScheduleDemo,
                format!("{} lead ready for a demo", tier.map(|t| t.as_str()).unwrap_or("warm")),
            ),
            (true, _, _) if info.role == Some(DecisionRole::DecisionMaker) => (
                RecommendedAction::ScheduleDemo,
                "Qualified decision maker".to_string(),
            ),
            (true, _, _) | (_, _, Some(IntentType::Pricing)) => (
                RecommendedAction::SendPricing,
                "Interested in cost before committing time".to_string(),
            ),
            (false, Some(_), _) => (
                RecommendedAction::NurtureSequence,
                "Scored below the qualification bar".to_string(),
            ),
            _ => (
                RecommendedAction::ContinueDiscovery,
                format!("Still missing: {}", info.missing_fields().join(", ")),
            ),
        };

        let mut talking_points: Vec<String> = info
            .current_challenges
            .iter()
            .take(3)
            .map(|c| format!("Address: {}", c))
            .collect();
        if let Some(budget) = info.budget {
            talking_points.push(format!("Frame pricing within {}", budget.label()));
        }
        if let Some(timeline) = info.timeline {
            talking_points.push(format!("Align rollout with {} timeline", timeline.as_str()));
        }

        Ok(Recommendation {
            action,
            rationale,
            talking_points,
        })
    }
}
