//! Prompt building for the qualification conversation
//!
//! The system prompt lists what is already known about the prospect and a
//! single `Still needed:` line naming the missing fields. The offline backend
//! reads that line back, so its format is part of the contract.

use lead_agent_core::{ChatMessage, CustomerInfo, GenerateRequest, MessageRole};

/// Prefix of the system prompt line listing missing fields
pub const STILL_NEEDED_PREFIX: &str = "Still needed:";

/// Marker used when nothing is missing
pub const NOTHING_NEEDED: &str = "nothing";

const PERSONA: &str = "You are a friendly, concise sales development assistant for ClaimFlow, \
an insurance-claims automation platform that automates intake, triage, document processing \
and fraud screening for carriers, TPAs and adjusting firms. Have a natural conversation, \
ask at most one question per reply, and never invent facts about the prospect.";

const REPLY_FORMAT: &str = r#"Reply with a single JSON object and nothing else:
{"response": "<your message to the prospect>",
 "customer_info": {"name": null, "email": null, "phone": null, "company": null, "industry": null,
                   "title": null, "employee_count": null, "current_challenges": [],
                   "budget": null, "timeline": null},
 "status": "active" | "ready_to_qualify"}
Only fill customer_info fields the prospect actually stated. Budget must be one of
"Under $10K", "$10K-$50K", "$50K-$100K", "$100K-$250K", "$250K+". Timeline must be one of
immediate, this_month, this_quarter, next_quarter, this_year, exploring.
Use "ready_to_qualify" only once every field above is known."#;

/// Builds chat-completion requests for the conversation stage
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    max_tokens: u32,
    temperature: f32,
    /// Most recent transcript messages included in the request
    history_window: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            max_tokens: 500,
            temperature: 0.7,
            history_window: 30,
        }
    }
}

impl PromptBuilder {
    pub fn new(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
            ..Default::default()
        }
    }

    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window.max(1);
        self
    }

    /// System prompt describing known and still-needed information
    pub fn system_prompt(&self, info: &CustomerInfo) -> String {
        let mut prompt = String::with_capacity(1024);
        prompt.push_str(PERSONA);
        prompt.push_str("\n\nKnown information:\n");

        let known = known_fields(info);
        if known.is_empty() {
            prompt.push_str("- none yet\n");
        }
        for (label, value) in known {
            prompt.push_str(&format!("- {}: {}\n", label, value));
        }

        let missing = info.missing_fields();
        prompt.push('\n');
        prompt.push_str(STILL_NEEDED_PREFIX);
        prompt.push(' ');
        if missing.is_empty() {
            prompt.push_str(NOTHING_NEEDED);
        } else {
            prompt.push_str(&missing.join(", "));
        }
        prompt.push_str("\n\n");
        prompt.push_str(REPLY_FORMAT);
        prompt
    }

    /// Full request for the conversation stage
    pub fn build_request(&self, messages: &[ChatMessage], info: &CustomerInfo) -> GenerateRequest {
        let start = messages.len().saturating_sub(self.history_window);

        messages[start..].iter().fold(
            GenerateRequest::new(self.system_prompt(info))
                .with_max_tokens(self.max_tokens)
                .with_temperature(self.temperature)
                .with_json_mode(true),
            |request, message| match message.role {
                MessageRole::User => request.with_user_message(&message.content),
                MessageRole::Assistant => request.with_assistant_message(&message.content),
            },
        )
    }
}

fn known_fields(info: &CustomerInfo) -> Vec<(&'static str, String)> {
    let mut known = Vec::new();
    let mut push = |label: &'static str, value: Option<String>| {
        if let Some(value) = value {
            known.push((label, value));
        }
    };

    push("Name", info.name.clone());
    push("Email", info.email.clone());
    push("Phone", info.phone.clone());
    push("Company", info.company.clone());
    push("Industry", info.industry.clone());
    push("Title", info.title.clone());
    push("Role", info.role.map(|r| r.as_str().to_string()));
    push(
        "Company size",
        info.company_size.map(|s| s.as_str().to_string()),
    );
    push("Budget", info.budget.map(|b| b.label().to_string()));
    push("Timeline", info.timeline.map(|t| t.as_str().to_string()));
    if !info.current_challenges.is_empty() {
        push("Challenges", Some(info.current_challenges.join("; ")));
    }
    known
}

/// Parse the missing fields back out of a system prompt
pub fn still_needed(system_prompt: &str) -> Option<Vec<String>> {
    let line = system_prompt
        .lines()
        .find_map(|line| line.trim().strip_prefix(STILL_NEEDED_PREFIX))?;
    let line = line.trim();
    if line.eq_ignore_ascii_case(NOTHING_NEEDED) {
        return Some(Vec::new());
    }
    Some(
        line.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    )
}
