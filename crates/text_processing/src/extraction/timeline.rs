//! Purchase timeline and intent extraction

use lead_agent_core::{IntentType, Timeline};
use once_cell::sync::Lazy;
use regex::Regex;

// Most urgent bucket first; the first bucket with a match wins
static TIMELINE_PATTERNS: Lazy<Vec<(Regex, Timeline)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"(?i)\b(?:asap|a\.s\.a\.p|immediately|right\s+away|right\s+now|urgent(?:ly)?|as\s+soon\s+as\s+possible|this\s+week|yesterday)\b").unwrap(),
            Timeline::Immediate,
        ),
        (
            Regex::new(r"(?i)\b(?:this\s+month|within\s+(?:a|the\s+next|one)\s+month|next\s+few\s+weeks|(?:in|within)\s+(?:2|3|two|three|a\s+few|a\s+couple\s+(?:of\s+)?)\s+weeks|next\s+30\s+days|end\s+of\s+(?:the\s+)?month)\b").unwrap(),
            Timeline::ThisMonth,
        ),
        (
            Regex::new(r"(?i)\b(?:this\s+quarter|end\s+of\s+(?:the\s+)?quarter|(?:within|next)\s+(?:2|3|two|three)\s+months|next\s+(?:60|90)\s+days|next\s+couple\s+(?:of\s+)?months|(?:in|within)\s+(?:a\s+)?couple\s+(?:of\s+)?months)\b").unwrap(),
            Timeline::ThisQuarter,
        ),
        (
            Regex::new(r"(?i)\b(?:next\s+quarter|(?:in|within)\s+(?:3|4|5|6|three|four|five|six)\s+months|few\s+months|q[1-4])\b").unwrap(),
            Timeline::NextQuarter,
        ),
        (
            Regex::new(r"(?i)\b(?:this\s+year|later\s+this\s+year|(?:by\s+)?(?:the\s+)?end\s+of\s+(?:the\s+)?year|within\s+(?:a|the)\s+year|next\s+12\s+months|(?:in|within)\s+(?:6|six|9|nine)\s+months)\b").unwrap(),
            Timeline::ThisYear,
        ),
        (
            Regex::new(r"(?i)\b(?:exploring|just\s+looking|researching|no\s+rush|no\s+timeline|no\s+set\s+timeline|not\s+sure\s+when|someday|eventually|next\s+year|down\s+the\s+road|early\s+stages?)\b").unwrap(),
            Timeline::Exploring,
        ),
    ]
});

/// Extract the purchase timeline bucket
pub fn extract_timeline(text: &str) -> Option<Timeline> {
    TIMELINE_PATTERNS
        .iter()
        .find(|(pattern, _)| pattern.is_match(text))
        .map(|(_, timeline)| *timeline)
}

static INTENT_PATTERNS: Lazy<Vec<(Regex, IntentType)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"(?i)\b(?:demo|demonstration|walk\s*-?\s*through|see\s+it\s+in\s+action|free\s+trial|trial)\b").unwrap(),
            IntentType::DemoRequest,
        ),
        (
            Regex::new(r"(?i)\b(?:pricing|price|prices|quote|how\s+much|what\s+does\s+it\s+cost|cost\s+of\s+(?:the|your))\b").unwrap(),
            IntentType::Pricing,
        ),
        (
            Regex::new(r"(?i)\b(?:integrat(?:e|es|ion|ions|ing)|api|connect\s+(?:to|with)\s+our|plug\s+into)\b").unwrap(),
            IntentType::Integration,
        ),
        (
            Regex::new(r"(?i)\b(?:partnership|partner\s+with\s+you|resell(?:er)?|white\s*-?\s*label|referral\s+partner)\b").unwrap(),
            IntentType::Partnership,
        ),
        (
            Regex::new(r"(?i)\b(?:existing\s+customer|our\s+account|not\s+working|bug|broken|support\s+request|help\s+with\s+my\s+account)\b").unwrap(),
            IntentType::Support,
        ),
    ]
});

/// Extract the primary intent
pub fn extract_intent(text: &str) -> Option<IntentType> {
    INTENT_PATTERNS
        .iter()
        .find(|(pattern, _)| pattern.is_match(text))
        .map(|(_, intent)| *intent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeline_buckets() {
        assert_eq!(extract_timeline("we need this ASAP"), Some(Timeline::Immediate));
        assert_eq!(
            extract_timeline("hoping to decide this month"),
            Some(Timeline::ThisMonth)
        );
        assert_eq!(
            extract_timeline("want to start this quarter"),
            Some(Timeline::ThisQuarter)
        );
        assert_eq!(
            extract_timeline("probably next quarter"),
            Some(Timeline::NextQuarter)
        );
        assert_eq!(
            extract_timeline("sometime later this year"),
            Some(Timeline::ThisYear)
        );
        assert_eq!(
            extract_timeline("we're just exploring options"),
            Some(Timeline::Exploring)
        );
        assert_eq!(extract_timeline("we process claims"), None);
    }

    #[test]
    fn test_within_does_not_match_in() {
        assert_eq!(
            extract_timeline("within three months"),
            Some(Timeline::ThisQuarter)
        );
    }

    #[test]
    fn test_urgency_wins() {
        assert_eq!(
            extract_timeline("this quarter at the latest, ideally right away"),
            Some(Timeline::Immediate)
        );
    }

    #[test]
    fn test_intent() {
        assert_eq!(
            extract_intent("Can I get a demo next week?"),
            Some(IntentType::DemoRequest)
        );
        assert_eq!(extract_intent("how much does it cost"), Some(IntentType::Pricing));
        assert_eq!(
            extract_intent("does it integrate with Guidewire"),
            Some(IntentType::Integration)
        );
        assert_eq!(extract_intent("we process claims"), None);
    }
}
