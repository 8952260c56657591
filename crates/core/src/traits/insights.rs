//! Analytics and recommendation providers run during parallel processing

use async_trait::async_trait;

use crate::{Analytics, ConversationState, Recommendation, Result};

#[async_trait]
pub trait AnalyticsProvider: Send + Sync + 'static {
    async fn analyze(&self, state: &ConversationState) -> Result<Analytics>;
}

#[async_trait]
pub trait RecommendationProvider: Send + Sync + 'static {
    async fn recommend(&self, state: &ConversationState) -> Result<Recommendation>;
}
