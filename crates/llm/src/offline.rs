//! Offline language model
//!
//! Produces structured replies without any network access by reading the
//! `Still needed:` line of the system prompt and asking for the first missing
//! field. Used for local runs and demos.

use async_trait::async_trait;
use lead_agent_core::{GenerateRequest, GenerateResponse, LanguageModel, Role};

use crate::prompt::still_needed;

#[derive(Debug, Clone, Default)]
pub struct OfflineBackend;

impl OfflineBackend {
    pub fn new() -> Self {
        Self
    }

    fn question_for(field: &str) -> &'static str {
        match field {
            "name" => "Thanks for reaching out! Who do I have the pleasure of speaking with?",
            "company" => "Which company are you with, and what industry are you in?",
            "challenges" => {
                "What's the biggest challenge in your claims process right now?"
            }
            "timeline" => "When are you hoping to have a solution in place?",
            "budget" => "Do you have a budget range in mind for this project?",
            "contact" => {
                "What's the best email or phone number for our team to follow up with you?"
            }
            _ => "Could you tell me a bit more about that?",
        }
    }
}

#[async_trait]
impl LanguageModel for OfflineBackend {
    async fn generate(&self, request: GenerateRequest) -> lead_agent_core::Result<GenerateResponse> {
        let missing = request
            .system_prompt()
            .and_then(still_needed)
            .unwrap_or_default();
        let user_turns = request
            .messages
            .iter()
            .filter(|m| m.role == Role::User)
            .count();

        let (response, status) = match missing.first() {
            Some(field) => (Self::question_for(field).to_string(), "active"),
            None if user_turns == 0 => (Self::question_for("name").to_string(), "active"),
            None => (
                "Thank you, that's everything I need. Someone from our team will be in touch shortly."
                    .to_string(),
                "ready_to_qualify",
            ),
        };

        let body = serde_json::json!({
            "response": response,
            "customer_info": {},
            "status": status,
        });

        Ok(GenerateResponse::text(body.to_string()))
    }

    fn model_name(&self) -> &str {
        "offline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::PromptBuilder;
    use crate::response::parse_model_reply;
    use lead_agent_core::{ChatMessage, ConversationStatus, CustomerInfo};

    #[tokio::test]
    async fn test_asks_for_first_missing_field() {
        let info = CustomerInfo {
            name: Some("Dana".into()),
            ..Default::default()
        };
        let request =
            PromptBuilder::default().build_request(&[ChatMessage::user("Hi, I'm Dana")], &info);

        let response = OfflineBackend::new().generate(request).await.unwrap();
        let reply = parse_model_reply(&response.text);

        assert!(reply.structured);
        assert!(reply.response.contains("company"));
        assert_eq!(reply.status, Some(ConversationStatus::Active));
    }

    #[tokio::test]
    async fn test_signals_ready_when_nothing_missing() {
        let info = CustomerInfo {
            name: Some("Dana".into()),
            email: Some("dana@northwind.io".into()),
            company: Some("Northwind".into()),
            current_challenges: vec!["manual claims intake".into()],
            timeline: Some(lead_agent_core::Timeline::ThisQuarter),
            budget: Some(lead_agent_core::BudgetRange::From50KTo100K),
            ..Default::default()
        };
        let request = PromptBuilder::default().build_request(&[ChatMessage::user("that's it")], &info);

        let response = OfflineBackend::new().generate(request).await.unwrap();
        let reply = parse_model_reply(&response.text);
        assert_eq!(reply.status, Some(ConversationStatus::ReadyToQualify));
    }
}
