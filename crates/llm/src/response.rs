//! Parsing of structured model replies
//!
//! Models are asked for `{"response", "customer_info", "status"}` but do not
//! always comply. Anything that is not a usable JSON object becomes a plain
//! reply with no profile changes.

use lead_agent_core::{
    BudgetRange, ConversationStatus, CustomerInfo, DecisionRole, IntentType, Timeline,
};
use serde_json::{Map, Value};

/// A model reply after parsing
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply {
    /// Text to show the prospect
    pub response: String,
    /// Profile fields the model reported
    pub customer_info: CustomerInfo,
    /// Status the model asked for, if any
    pub status: Option<ConversationStatus>,
    /// Whether the reply was valid structured output
    pub structured: bool,
}

impl ModelReply {
    fn plain(text: &str) -> Self {
        Self {
            response: text.trim().to_string(),
            customer_info: CustomerInfo::default(),
            status: None,
            structured: false,
        }
    }
}

/// Parse raw model output
pub fn parse_model_reply(raw: &str) -> ModelReply {
    let Some(object) = find_json_object(raw) else {
        return ModelReply::plain(raw);
    };

    let Some(response) = object
        .get("response")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
    else {
        tracing::debug!("Structured reply missing response text, treating as plain");
        return ModelReply::plain(raw);
    };

    let customer_info = object
        .get("customer_info")
        .and_then(Value::as_object)
        .map(customer_info_from_json)
        .unwrap_or_default();

    let status = object
        .get("status")
        .and_then(Value::as_str)
        .and_then(parse_status);

    ModelReply {
        response: response.to_string(),
        customer_info,
        status,
        structured: true,
    }
}

/// Locate the outermost `{ ... }` span and parse it
fn find_json_object(raw: &str) -> Option<Map<String, Value>> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&raw[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "Model reply is not valid JSON");
            None
        }
    }
}

fn parse_status(s: &str) -> Option<ConversationStatus> {
    match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
        "active" => Some(ConversationStatus::Active),
        "ready_to_qualify" | "ready" => Some(ConversationStatus::ReadyToQualify),
        "qualified" => Some(ConversationStatus::Qualified),
        "completed" => Some(ConversationStatus::Completed),
        "abandoned" => Some(ConversationStatus::Abandoned),
        _ => None,
    }
}

fn text(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => {
            let s = s.trim();
            let placeholder = s.is_empty()
                || s.eq_ignore_ascii_case("null")
                || s.eq_ignore_ascii_case("unknown")
                || s.eq_ignore_ascii_case("n/a");
            (!placeholder).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(map: &Map<String, Value>, key: &str) -> Option<u64> {
    match map.get(key)? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.round() as u64)),
        Value::String(s) => s.replace([',', '$', '+'], "").trim().parse().ok(),
        _ => None,
    }
}

fn customer_info_from_json(map: &Map<String, Value>) -> CustomerInfo {
    let challenges = match map.get("current_challenges").or_else(|| map.get("challenges")) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    };

    let budget_amount = number(map, "budget_amount");
    let budget = text(map, "budget")
        .and_then(|b| BudgetRange::from_label(&b))
        .or_else(|| budget_amount.map(BudgetRange::from_amount));

    let email = text(map, "email")
        .map(|e| e.to_lowercase())
        .filter(|e| e.contains('@') && e.contains('.'));

    let employee_count = number(map, "employee_count").and_then(|n| u32::try_from(n).ok());

    CustomerInfo {
        name: text(map, "name"),
        email,
        phone: text(map, "phone"),
        company: text(map, "company"),
        industry: text(map, "industry").map(|i| i.to_lowercase()),
        employee_count,
        company_size: employee_count.map(lead_agent_core::CompanySize::from_employee_count),
        title: text(map, "title"),
        role: text(map, "role").and_then(|r| DecisionRole::parse(&r)),
        current_challenges: challenges,
        budget,
        budget_amount,
        timeline: text(map, "timeline").and_then(|t| Timeline::parse(&t)),
        intent_type: text(map, "intent_type").and_then(|i| IntentType::parse(&i)),
        opportunity_summary: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_reply() {
        let raw = r#"{"response": "Thanks John! What's your budget?",
            "customer_info": {"name": "John Smith", "company": "Acme Corp",
                              "budget": "$100K-$250K", "timeline": "this quarter",
                              "current_challenges": ["ticket backlog"], "email": null},
            "status": "active"}"#;
        let reply = parse_model_reply(raw);

        assert!(reply.structured);
        assert_eq!(reply.response, "Thanks John! What's your budget?");
        assert_eq!(reply.customer_info.name.as_deref(), Some("John Smith"));
        assert_eq!(reply.customer_info.budget, Some(BudgetRange::From100KTo250K));
        assert_eq!(reply.customer_info.timeline, Some(Timeline::ThisQuarter));
        assert_eq!(reply.customer_info.current_challenges.len(), 1);
        assert!(reply.customer_info.email.is_none());
        assert_eq!(reply.status, Some(ConversationStatus::Active));
    }

    #[test]
    fn test_json_wrapped_in_prose() {
        let raw = "Sure! ```json\n{\"response\": \"Hello\", \"status\": \"ready_to_qualify\"}\n```";
        let reply = parse_model_reply(raw);
        assert!(reply.structured);
        assert_eq!(reply.response, "Hello");
        assert_eq!(reply.status, Some(ConversationStatus::ReadyToQualify));
    }

    #[test]
    fn test_plain_text_fallback() {
        let reply = parse_model_reply("  What does your claims process look like today?  ");
        assert!(!reply.structured);
        assert_eq!(
            reply.response,
            "What does your claims process look like today?"
        );
        assert!(reply.customer_info.is_empty());
        assert_eq!(reply.status, None);
    }

    #[test]
    fn test_broken_json_fallback() {
        let reply = parse_model_reply("{\"response\": \"cut off");
        assert!(!reply.structured);
        assert_eq!(reply.status, None);
    }

    #[test]
    fn test_budget_amount_only() {
        let raw = r#"{"response": "ok", "customer_info": {"budget_amount": "75,000"}}"#;
        let reply = parse_model_reply(raw);
        assert_eq!(reply.customer_info.budget, Some(BudgetRange::From50KTo100K));
        assert_eq!(reply.customer_info.budget_amount, Some(75_000));
    }
}
