//! Customer profile accumulated over a conversation

use serde::{Deserialize, Serialize};

/// Company size bucket derived from employee count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanySize {
    Startup,
    Small,
    Medium,
    Large,
    Enterprise,
}

impl CompanySize {
    pub fn from_employee_count(count: u32) -> Self {
        match count {
            0..=9 => CompanySize::Startup,
            10..=49 => CompanySize::Small,
            50..=249 => CompanySize::Medium,
            250..=999 => CompanySize::Large,
            _ => CompanySize::Enterprise,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompanySize::Startup => "startup",
            CompanySize::Small => "small",
            CompanySize::Medium => "medium",
            CompanySize::Large => "large",
            CompanySize::Enterprise => "enterprise",
        }
    }
}

/// Buying authority derived from job title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionRole {
    DecisionMaker,
    Influencer,
    Researcher,
}

impl DecisionRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionRole::DecisionMaker => "decision_maker",
            DecisionRole::Influencer => "influencer",
            DecisionRole::Researcher => "researcher",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "decision_maker" => Some(DecisionRole::DecisionMaker),
            "influencer" => Some(DecisionRole::Influencer),
            "researcher" => Some(DecisionRole::Researcher),
            _ => None,
        }
    }
}

/// Budget bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BudgetRange {
    #[serde(rename = "Under $10K")]
    Under10K,
    #[serde(rename = "$10K-$50K")]
    From10KTo50K,
    #[serde(rename = "$50K-$100K")]
    From50KTo100K,
    #[serde(rename = "$100K-$250K")]
    From100KTo250K,
    #[serde(rename = "$250K+")]
    Over250K,
}

impl BudgetRange {
    /// Bucket a normalized dollar amount
    pub fn from_amount(amount: u64) -> Self {
        match amount {
            0..=9_999 => BudgetRange::Under10K,
            10_000..=49_999 => BudgetRange::From10KTo50K,
            50_000..=99_999 => BudgetRange::From50KTo100K,
            100_000..=249_999 => BudgetRange::From100KTo250K,
            _ => BudgetRange::Over250K,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BudgetRange::Under10K => "Under $10K",
            BudgetRange::From10KTo50K => "$10K-$50K",
            BudgetRange::From50KTo100K => "$50K-$100K",
            BudgetRange::From100KTo250K => "$100K-$250K",
            BudgetRange::Over250K => "$250K+",
        }
    }

    /// Parse a bucket label, ignoring case and whitespace
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        [
            BudgetRange::Under10K,
            BudgetRange::From10KTo50K,
            BudgetRange::From50KTo100K,
            BudgetRange::From100KTo250K,
            BudgetRange::Over250K,
        ]
        .into_iter()
        .find(|b| b.label().replace(' ', "").to_lowercase() == normalized)
    }
}

impl std::fmt::Display for BudgetRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Purchase urgency bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeline {
    Immediate,
    ThisMonth,
    ThisQuarter,
    NextQuarter,
    ThisYear,
    Exploring,
}

impl Timeline {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeline::Immediate => "immediate",
            Timeline::ThisMonth => "this_month",
            Timeline::ThisQuarter => "this_quarter",
            Timeline::NextQuarter => "next_quarter",
            Timeline::ThisYear => "this_year",
            Timeline::Exploring => "exploring",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "immediate" | "asap" | "immediately" => Some(Timeline::Immediate),
            "this_month" => Some(Timeline::ThisMonth),
            "this_quarter" => Some(Timeline::ThisQuarter),
            "next_quarter" => Some(Timeline::NextQuarter),
            "this_year" => Some(Timeline::ThisYear),
            "exploring" => Some(Timeline::Exploring),
            _ => None,
        }
    }
}

/// What the prospect is primarily asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    DemoRequest,
    Pricing,
    Integration,
    Partnership,
    Support,
}

impl IntentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentType::DemoRequest => "demo_request",
            IntentType::Pricing => "pricing",
            IntentType::Integration => "integration",
            IntentType::Partnership => "partnership",
            IntentType::Support => "support",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "demo_request" | "demo" => Some(IntentType::DemoRequest),
            "pricing" => Some(IntentType::Pricing),
            "integration" => Some(IntentType::Integration),
            "partnership" => Some(IntentType::Partnership),
            "support" => Some(IntentType::Support),
            _ => None,
        }
    }
}

/// How a customer-info patch is merged into the existing profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Only empty fields are written
    #[default]
    FillEmpty,
    /// Empty fields are written and text fields may be replaced by a strict extension
    Refine,
}

/// Prospect profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub industry: Option<String>,
    pub employee_count: Option<u32>,
    pub company_size: Option<CompanySize>,
    pub title: Option<String>,
    pub role: Option<DecisionRole>,
    pub current_challenges: Vec<String>,
    pub budget: Option<BudgetRange>,
    pub budget_amount: Option<u64>,
    pub timeline: Option<Timeline>,
    pub intent_type: Option<IntentType>,
    pub opportunity_summary: Option<String>,
}

impl CustomerInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_contact(&self) -> bool {
        self.email.is_some() || self.phone.is_some()
    }

    pub fn has_business_context(&self) -> bool {
        self.company.is_some() || self.industry.is_some()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge a patch into this profile
    ///
    /// Never clears a field. Challenges are unioned by exact string match
    /// in first-seen order. Returns whether anything changed.
    pub fn merge(&mut self, patch: &CustomerInfo, policy: MergePolicy) -> bool {
        let mut changed = false;

        changed |= merge_text(&mut self.name, &patch.name, policy);
        changed |= merge_text(&mut self.email, &patch.email, MergePolicy::FillEmpty);
        changed |= merge_text(&mut self.phone, &patch.phone, MergePolicy::FillEmpty);
        changed |= merge_text(&mut self.company, &patch.company, policy);
        changed |= merge_text(&mut self.industry, &patch.industry, policy);
        changed |= merge_text(&mut self.title, &patch.title, policy);
        changed |= merge_text(
            &mut self.opportunity_summary,
            &patch.opportunity_summary,
            policy,
        );

        changed |= fill(&mut self.employee_count, &patch.employee_count);
        changed |= fill(&mut self.company_size, &patch.company_size);
        changed |= fill(&mut self.role, &patch.role);
        changed |= fill(&mut self.budget, &patch.budget);
        changed |= fill(&mut self.budget_amount, &patch.budget_amount);
        changed |= fill(&mut self.timeline, &patch.timeline);
        changed |= fill(&mut self.intent_type, &patch.intent_type);

        if self.company_size.is_none() {
            if let Some(count) = self.employee_count {
                self.company_size = Some(CompanySize::from_employee_count(count));
                changed = true;
            }
        }

        for challenge in &patch.current_challenges {
            let challenge = challenge.trim();
            if challenge.is_empty() {
                continue;
            }
            if !self.current_challenges.iter().any(|c| c == challenge) {
                self.current_challenges.push(challenge.to_string());
                changed = true;
            }
        }

        changed
    }

    /// Names of qualifying fields still missing, in asking order
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.is_none() {
            missing.push("name");
        }
        if !self.has_business_context() {
            missing.push("company");
        }
        if self.current_challenges.is_empty() {
            missing.push("challenges");
        }
        if self.timeline.is_none() {
            missing.push("timeline");
        }
        if self.budget.is_none() {
            missing.push("budget");
        }
        if !self.has_contact() {
            missing.push("contact");
        }
        missing
    }
}

fn fill<T: Clone>(current: &mut Option<T>, incoming: &Option<T>) -> bool {
    if current.is_none() {
        if let Some(value) = incoming {
            *current = Some(value.clone());
            return true;
        }
    }
    false
}

fn merge_text(current: &mut Option<String>, incoming: &Option<String>, policy: MergePolicy) -> bool {
    let Some(incoming) = incoming.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        return false;
    };

    match current {
        None => {
            *current = Some(incoming.to_string());
            true
        }
        Some(existing) if policy == MergePolicy::Refine && extends(existing, incoming) => {
            *current = Some(incoming.to_string());
            true
        }
        Some(_) => false,
    }
}

/// `candidate` starts with `existing` (ignoring case) and is longer
fn extends(existing: &str, candidate: &str) -> bool {
    candidate.len() > existing.len()
        && candidate
            .to_lowercase()
            .starts_with(&existing.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_size_breakpoints() {
        assert_eq!(CompanySize::from_employee_count(5), CompanySize::Startup);
        assert_eq!(CompanySize::from_employee_count(10), CompanySize::Small);
        assert_eq!(CompanySize::from_employee_count(249), CompanySize::Medium);
        assert_eq!(CompanySize::from_employee_count(250), CompanySize::Large);
        assert_eq!(CompanySize::from_employee_count(1000), CompanySize::Enterprise);
    }

    #[test]
    fn test_budget_buckets() {
        assert_eq!(BudgetRange::from_amount(5_000), BudgetRange::Under10K);
        assert_eq!(BudgetRange::from_amount(50_000), BudgetRange::From50KTo100K);
        assert_eq!(BudgetRange::from_amount(150_000), BudgetRange::From100KTo250K);
        assert_eq!(BudgetRange::from_amount(250_000), BudgetRange::Over250K);
        assert_eq!(
            BudgetRange::from_label("$100k - $250k"),
            Some(BudgetRange::From100KTo250K)
        );
        assert_eq!(
            serde_json::to_string(&BudgetRange::Over250K).unwrap(),
            "\"$250K+\""
        );
    }

    #[test]
    fn test_fill_empty_never_overwrites() {
        let mut info = CustomerInfo {
            name: Some("John".into()),
            ..Default::default()
        };
        let patch = CustomerInfo {
            name: Some("John Smith".into()),
            email: Some("john@acme.com".into()),
            ..Default::default()
        };

        assert!(info.merge(&patch, MergePolicy::FillEmpty));
        assert_eq!(info.name.as_deref(), Some("John"));
        assert_eq!(info.email.as_deref(), Some("john@acme.com"));
    }

    #[test]
    fn test_fill_empty_is_idempotent() {
        let mut info = CustomerInfo::new();
        let patch = CustomerInfo {
            company: Some("Acme Corp".into()),
            current_challenges: vec!["manual claims review takes days".into()],
            ..Default::default()
        };

        assert!(info.merge(&patch, MergePolicy::FillEmpty));
        let snapshot = info.clone();
        assert!(!info.merge(&patch, MergePolicy::FillEmpty));
        assert_eq!(info, snapshot);
    }

    #[test]
    fn test_refine_extends_but_never_clears() {
        let mut info = CustomerInfo {
            name: Some("John".into()),
            company: Some("Acme".into()),
            ..Default::default()
        };
        let patch = CustomerInfo {
            name: Some("John Smith".into()),
            company: Some("Globex".into()),
            ..Default::default()
        };

        info.merge(&patch, MergePolicy::Refine);
        assert_eq!(info.name.as_deref(), Some("John Smith"));
        assert_eq!(info.company.as_deref(), Some("Acme"));

        info.merge(&CustomerInfo::new(), MergePolicy::Refine);
        assert_eq!(info.name.as_deref(), Some("John Smith"));
    }

    #[test]
    fn test_challenges_union() {
        let mut info = CustomerInfo {
            current_challenges: vec!["slow claims intake".into()],
            ..Default::default()
        };
        let patch = CustomerInfo {
            current_challenges: vec!["slow claims intake".into(), "fraud review backlog".into()],
            ..Default::default()
        };
        info.merge(&patch, MergePolicy::FillEmpty);
        assert_eq!(info.current_challenges.len(), 2);
    }

    #[test]
    fn test_employee_count_derives_size() {
        let mut info = CustomerInfo::new();
        info.merge(
            &CustomerInfo {
                employee_count: Some(120),
                ..Default::default()
            },
            MergePolicy::FillEmpty,
        );
        assert_eq!(info.company_size, Some(CompanySize::Medium));
    }

    #[test]
    fn test_missing_fields() {
        let info = CustomerInfo {
            email: Some("a@b.co".into()),
            industry: Some("insurance".into()),
            ..Default::default()
        };
        assert_eq!(
            info.missing_fields(),
            vec!["name", "challenges", "timeline", "budget"]
        );
    }
}
