//! Customer information extraction
//!
//! Each field has its own narrow extractor (`fn(&str) -> Option<T>`) so they
//! can be tested and reused in isolation. `CustomerInfoExtractor` composes them
//! into a fill-empty patch for a single user message.
//!
//! All patterns are static and compiled once via `once_cell::sync::Lazy`.

mod budget;
mod business;
mod challenges;
mod contact;
mod identity;
mod timeline;

pub use budget::extract_budget;
pub use business::{extract_company, extract_employee_count, extract_industry};
pub use challenges::extract_challenges;
pub use contact::{extract_email, extract_phone};
pub use identity::{extract_name, extract_title, role_for_title};
pub use timeline::{extract_intent, extract_timeline};

use lead_agent_core::{CompanySize, CustomerInfo};

/// Rule-based extractor producing a `CustomerInfo` patch
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomerInfoExtractor;

impl CustomerInfoExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Run every extractor over one message
    pub fn extract(&self, text: &str) -> CustomerInfo {
        let title = extract_title(text);
        let role = title.as_deref().map(role_for_title);
        let employee_count = extract_employee_count(text);
        let budget = extract_budget(text);

        let info = CustomerInfo {
            name: extract_name(text),
            email: extract_email(text),
            phone: extract_phone(text),
            company: extract_company(text),
            industry: extract_industry(text),
            employee_count,
            company_size: employee_count.map(CompanySize::from_employee_count),
            title,
            role,
            current_challenges: extract_challenges(text),
            budget: budget.map(|(range, _)| range),
            budget_amount: budget.map(|(_, amount)| amount),
            timeline: extract_timeline(text),
            intent_type: extract_intent(text),
            opportunity_summary: None,
        };

        if !info.is_empty() {
            tracing::debug!(
                name = info.name.is_some(),
                email = info.email.is_some(),
                phone = info.phone.is_some(),
                company = info.company.is_some(),
                budget = ?info.budget,
                timeline = ?info.timeline,
                challenges = info.current_challenges.len(),
                "Extracted customer info"
            );
        }

        info
    }
}
