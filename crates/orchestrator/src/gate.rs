//! Readiness gate
//!
//! Decides whether a conversation has gathered enough to be qualified. The
//! gate is authoritative: a model that claims readiness early is overruled.

use lead_agent_config::QualificationConfig;
use lead_agent_core::{ChatMessage, CustomerInfo};
use lead_agent_text_processing::{is_signoff, is_specific_challenge, is_substantive};

/// Outcome of a gate check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision {
    pub ready: bool,
    /// Unmet requirements, empty when the information path passed
    pub missing: Vec<&'static str>,
    pub substantive_turns: usize,
    /// Passed on the sign-off path rather than the information path
    pub via_signoff: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ReadinessGate {
    min_substantive_turns: usize,
    signoff_min_turns: usize,
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self {
            min_substantive_turns: 6,
            signoff_min_turns: 8,
        }
    }
}

impl ReadinessGate {
    pub fn new(min_substantive_turns: usize, signoff_min_turns: usize) -> Self {
        Self {
            min_substantive_turns,
            signoff_min_turns,
        }
    }

    pub fn from_config(config: &QualificationConfig) -> Self {
        Self::new(config.min_substantive_turns, config.signoff_min_turns)
    }

    pub fn evaluate(&self, info: &CustomerInfo, messages: &[ChatMessage]) -> GateDecision {
        let substantive_turns = substantive_turns(messages);
        let mut missing = Vec::new();

        if !info.has_contact() {
            missing.push("contact");
        }
        if !has_specific_challenge(info) {
            missing.push("specific_challenge");
        }
        if !info.has_business_context() {
            missing.push("business_context");
        }
        if info.timeline.is_none() {
            missing.push("timeline");
        }
        if info.budget.is_none() {
            missing.push("budget");
        }
        if substantive_turns < self.min_substantive_turns {
            missing.push("substantive_turns");
        }

        let user_turns = messages.iter().filter(|m| m.is_user()).count();
        let signed_off = user_turns >= self.signoff_min_turns
            && messages
                .iter()
                .rev()
                .find(|m| m.is_user())
                .is_some_and(|m| is_signoff(&m.content));

        GateDecision {
            ready: missing.is_empty() || signed_off,
            via_signoff: !missing.is_empty() && signed_off,
            missing,
            substantive_turns,
        }
    }
}

pub fn has_specific_challenge(info: &CustomerInfo) -> bool {
    info.current_challenges
        .iter()
        .any(|c| is_specific_challenge(c))
}

pub fn substantive_turns(messages: &[ChatMessage]) -> usize {
    messages
        .iter()
        .filter(|m| m.is_user() && is_substantive(&m.content))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lead_agent_core::{BudgetRange, Timeline};

    fn complete_info() -> CustomerInfo {
        CustomerInfo {
            email: Some("dana@northwind.io".into()),
            company: Some("Northwind Mutual".into()),
            current_challenges: vec!["claims intake is done by hand".into()],
            timeline: Some(Timeline::ThisQuarter),
            budget: Some(BudgetRange::From50KTo100K),
            ..Default::default()
        }
    }

    fn turns(n: usize) -> Vec<ChatMessage> {
        (0..n)
            .flat_map(|i| {
                [
                    ChatMessage::user(format!("here is detail number {} about our claims", i)),
                    ChatMessage::assistant("Tell me more."),
                ]
            })
            .collect()
    }

    #[test]
    fn test_ready_with_complete_info() {
        let decision = ReadinessGate::default().evaluate(&complete_info(), &turns(6));
        assert!(decision.ready);
        assert!(decision.missing.is_empty());
        assert!(!decision.via_signoff);
    }

    #[test]
    fn test_not_ready_with_too_few_turns() {
        let decision = ReadinessGate::default().evaluate(&complete_info(), &turns(5));
        assert!(!decision.ready);
        assert_eq!(decision.missing, vec!["substantive_turns"]);
    }

    #[test]
    fn test_acknowledgements_do_not_count() {
        let mut messages = turns(5);
        messages.push(ChatMessage::user("ok thanks"));
        let decision = ReadinessGate::default().evaluate(&complete_info(), &messages);
        assert_eq!(decision.substantive_turns, 5);
        assert!(!decision.ready);
    }

    #[test]
    fn test_generic_challenge_blocks() {
        let info = CustomerInfo {
            current_challenges: vec!["improve efficiency".into()],
            ..complete_info()
        };
        let decision = ReadinessGate::default().evaluate(&info, &turns(6));
        assert!(!decision.ready);
        assert_eq!(decision.missing, vec!["specific_challenge"]);
    }

    #[test]
    fn test_signoff_path() {
        let mut messages = turns(7);
        messages.push(ChatMessage::user("Thanks, goodbye!"));
        let decision = ReadinessGate::default().evaluate(&CustomerInfo::default(), &messages);
        assert!(decision.ready);
        assert!(decision.via_signoff);

        let mut short = turns(6);
        short.push(ChatMessage::user("Thanks, goodbye!"));
        assert!(!ReadinessGate::default()
            .evaluate(&CustomerInfo::default(), &short)
            .ready);
    }
}
