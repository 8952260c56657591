//! Routing between stages
//!
//! ```text
//! conversation ──► extraction ──► [ui_interaction] ──► [qualification] ──► parallel_processing
//!      │               ▲                                                          │
//!      ▼               │                                                          ▼
//! error_recovery ──────┘                                          notification | nurture | end
//! ```
//!
//! `None` means the turn is over and the graph waits for the next user
//! message. Any failed stage routes to error_recovery. A failed conversation
//! stage still lets extraction read the user's message.

use lead_agent_core::{ConversationState, ConversationStatus, NotificationType, StageId};

use crate::gate::substantive_turns;

#[derive(Debug, Clone, Copy)]
pub struct Router {
    /// User turns between contact-form prompts
    contact_prompt_interval: usize,
    /// Failed hand-offs tolerated per delivery channel
    max_delivery_attempts: usize,
}

impl Default for Router {
    fn default() -> Self {
        Self {
            contact_prompt_interval: 3,
            max_delivery_attempts: 3,
        }
    }
}

impl Router {
    pub fn new(contact_prompt_interval: usize) -> Self {
        Self {
            contact_prompt_interval: contact_prompt_interval.max(1),
            ..Self::default()
        }
    }

    pub fn with_delivery_attempts(mut self, attempts: usize) -> Self {
        self.max_delivery_attempts = attempts.max(1);
        self
    }

    pub fn next(&self, from: StageId, state: &ConversationState, failed: bool) -> Option<StageId> {
        if failed {
            return match from {
                StageId::ErrorRecovery => None,
                _ => Some(StageId::ErrorRecovery),
            };
        }

        match from {
            StageId::Conversation => Some(StageId::Extraction),
            StageId::Extraction => {
                if self.needs_contact_prompt(state) {
                    Some(StageId::UiInteraction)
                } else if awaiting_qualification(state) {
                    Some(StageId::Qualification)
                } else {
                    Some(StageId::ParallelProcessing)
                }
            }
            StageId::UiInteraction => {
                if awaiting_qualification(state) {
                    Some(StageId::Qualification)
                } else {
                    Some(StageId::ParallelProcessing)
                }
            }
            StageId::Qualification => Some(StageId::ParallelProcessing),
            StageId::ParallelProcessing => self.delivery(state),
            StageId::ErrorRecovery => {
                let failed_stage = state.errors.last().map(|e| e.agent);
                (failed_stage == Some(StageId::Conversation)).then_some(StageId::Extraction)
            }
            StageId::Notification | StageId::Nurture => None,
        }
    }

    /// Pending delivery that has not yet used up its attempts
    pub fn delivery(&self, state: &ConversationState) -> Option<StageId> {
        let stage = delivery_route(state)?;
        let failures = state.errors.iter().filter(|e| e.agent == stage).count();
        (failures < self.max_delivery_attempts).then_some(stage)
    }

    /// Contact is missing, enough has been said, and the form was not shown recently
    pub fn needs_contact_prompt(&self, state: &ConversationState) -> bool {
        if state.customer_info.has_contact() || state.conversation_status.is_closed() {
            return false;
        }
        if substantive_turns(&state.messages) < self.contact_prompt_interval {
            return false;
        }
        let turn = state.user_turn_count();
        state
            .last_contact_prompt_turn
            .map_or(true, |last| turn >= last + self.contact_prompt_interval)
    }
}

fn awaiting_qualification(state: &ConversationState) -> bool {
    state.conversation_status == ConversationStatus::ReadyToQualify
        && state.qualification.is_none()
}

/// Pending notification or nurture enrolment for a scored lead
pub fn delivery_route(state: &ConversationState) -> Option<StageId> {
    let qualification = state.qualification.as_ref()?;
    if qualification.is_qualified {
        (!state.has_notification(NotificationType::Qualification)).then_some(StageId::Notification)
    } else {
        (!state.has_notification(NotificationType::Nurture)).then_some(StageId::Nurture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lead_agent_core::{
        ChatMessage, ErrorRecord, LeadTier, NotificationRecord, Qualification, StateUpdate,
    };

    fn qualification(is_qualified: bool) -> Qualification {
        Qualification {
            budget_score: 10,
            authority_score: 5,
            need_score: 35,
            timeline_score: 7,
            total_score: 57,
            is_qualified,
            tier: LeadTier::Qualified,
            reasons: vec![],
            qualified_at: Utc::now(),
        }
    }

    fn chatty_state(turns: usize) -> ConversationState {
        let mut state = ConversationState::new("s1");
        for i in 0..turns {
            state.apply(
                StateUpdate::new()
                    .with_message(ChatMessage::user(format!("we process {} claims weekly", i)))
                    .with_message(ChatMessage::assistant("Got it.")),
            );
        }
        state
    }

    fn failure(agent: StageId) -> ErrorRecord {
        ErrorRecord {
            timestamp: Utc::now(),
            agent,
            error: "upstream unavailable".into(),
            recovered: false,
        }
    }

    #[test]
    fn test_failure_routes_to_recovery() {
        let router = Router::default();
        let mut state = ConversationState::new("s1");
        assert_eq!(
            router.next(StageId::Conversation, &state, true),
            Some(StageId::ErrorRecovery)
        );
        assert_eq!(router.next(StageId::ErrorRecovery, &state, true), None);
        assert_eq!(router.next(StageId::ErrorRecovery, &state, false), None);

        state.errors.push(failure(StageId::Notification));
        assert_eq!(router.next(StageId::ErrorRecovery, &state, false), None);
    }

    #[test]
    fn test_recovery_resumes_extraction_after_conversation_failure() {
        let router = Router::default();
        let mut state = chatty_state(1);
        state.errors.push(failure(StageId::Conversation));
        assert_eq!(
            router.next(StageId::ErrorRecovery, &state, false),
            Some(StageId::Extraction)
        );
    }

    #[test]
    fn test_quiet_turn_refreshes_insights() {
        let router = Router::default();
        let state = chatty_state(1);
        assert_eq!(
            router.next(StageId::Conversation, &state, false),
            Some(StageId::Extraction)
        );
        assert_eq!(
            router.next(StageId::Extraction, &state, false),
            Some(StageId::ParallelProcessing)
        );
        assert_eq!(router.next(StageId::ParallelProcessing, &state, false), None);
    }

    #[test]
    fn test_contact_prompt_interval() {
        let router = Router::new(3);
        let mut state = chatty_state(3);
        assert_eq!(
            router.next(StageId::Extraction, &state, false),
            Some(StageId::UiInteraction)
        );
        assert_eq!(
            router.next(StageId::UiInteraction, &state, false),
            Some(StageId::ParallelProcessing)
        );

        state.last_contact_prompt_turn = Some(3);
        assert!(!router.needs_contact_prompt(&state));

        let mut state = chatty_state(6);
        state.last_contact_prompt_turn = Some(3);
        assert!(router.needs_contact_prompt(&state));

        state.customer_info.email = Some("dana@northwind.io".into());
        assert!(!router.needs_contact_prompt(&state));
    }

    #[test]
    fn test_ready_routes_to_qualification() {
        let router = Router::default();
        let mut state = chatty_state(1);
        state.conversation_status = ConversationStatus::ReadyToQualify;
        assert_eq!(
            router.next(StageId::Extraction, &state, false),
            Some(StageId::Qualification)
        );
        assert_eq!(
            router.next(StageId::Qualification, &state, false),
            Some(StageId::ParallelProcessing)
        );
    }

    #[test]
    fn test_delivery_routes() {
        let router = Router::default();
        let mut state = ConversationState::new("s1");
        assert_eq!(router.next(StageId::ParallelProcessing, &state, false), None);

        state.qualification = Some(qualification(true));
        assert_eq!(
            router.next(StageId::ParallelProcessing, &state, false),
            Some(StageId::Notification)
        );

        state.notifications_sent.push(NotificationRecord {
            notification_type: NotificationType::Qualification,
            timestamp: Utc::now(),
            detail: "log:s1".into(),
        });
        assert_eq!(router.next(StageId::ParallelProcessing, &state, false), None);

        state.qualification = Some(qualification(false));
        assert_eq!(
            router.next(StageId::ParallelProcessing, &state, false),
            Some(StageId::Nurture)
        );
        assert_eq!(router.next(StageId::Nurture, &state, false), None);
    }

    #[test]
    fn test_delivery_gives_up_after_repeated_failures() {
        let router = Router::default().with_delivery_attempts(2);
        let mut state = ConversationState::new("s1");
        state.qualification = Some(qualification(true));

        state.errors.push(failure(StageId::Notification));
        assert_eq!(router.delivery(&state), Some(StageId::Notification));

        state.errors.push(failure(StageId::Nurture));
        assert_eq!(router.delivery(&state), Some(StageId::Notification));

        state.errors.push(failure(StageId::Notification));
        assert_eq!(router.delivery(&state), None);
        assert_eq!(delivery_route(&state), Some(StageId::Notification));
    }
}
