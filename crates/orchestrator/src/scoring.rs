//! BANT lead scoring
//!
//! Points per signal:
//!
//! | signal | points |
//! |---|---|
//! | contact channel | 15, +5 with both email and phone |
//! | company or industry | 10, +5 with both |
//! | specific challenge | 10, +5 with two or more |
//! | name | 5 |
//! | budget bucket | 15 / 10 / 6 / 3 / 0 |
//! | timeline bucket | 15 / 10 / 7 / 3 / 0 |
//! | role | 5, 10 for a decision maker |
//!
//! The total is clamped to 100.

use chrono::Utc;
use lead_agent_config::QualificationConfig;
use lead_agent_core::{
    BudgetRange, CustomerInfo, DecisionRole, LeadTier, Qualification, TierThresholds, Timeline,
};
use lead_agent_text_processing::is_specific_challenge;

const MAX_SCORE: u32 = 100;

#[derive(Debug, Clone)]
pub struct LeadScorer {
    thresholds: TierThresholds,
    /// Minimum total for `is_qualified`
    qualified_score: u32,
}

impl Default for LeadScorer {
    fn default() -> Self {
        Self {
            thresholds: TierThresholds::default(),
            qualified_score: 30,
        }
    }
}

impl LeadScorer {
    pub fn new(thresholds: TierThresholds, qualified_score: u32) -> Self {
        Self {
            thresholds,
            qualified_score,
        }
    }

    pub fn from_config(config: &QualificationConfig) -> Self {
        Self::new(
            TierThresholds {
                hot: config.hot_threshold,
                warm: config.warm_threshold,
                qualified: config.qualified_threshold,
                viable: config.viable_threshold,
            },
            config.qualified_score,
        )
    }

    pub fn score(&self, info: &CustomerInfo) -> Qualification {
        let mut reasons = Vec::new();
        let mut need = 0;
        let mut authority = 0;

        // Need: reachable, known business, concrete pain
        if info.has_contact() {
            need += 15;
            if info.email.is_some() && info.phone.is_some() {
                need += 5;
                reasons.push("Provided email and phone".to_string());
            } else {
                reasons.push("Provided a contact channel".to_string());
            }
        }

        if info.has_business_context() {
            need += 10;
            if info.company.is_some() && info.industry.is_some() {
                need += 5;
            }
            match (&info.company, &info.industry) {
                (Some(company), Some(industry)) => {
                    reasons.push(format!("Works at {} ({})", company, industry))
                }
                (Some(company), None) => reasons.push(format!("Works at {}", company)),
                (None, Some(industry)) => reasons.push(format!("Operates in {}", industry)),
                (None, None) => {}
            }
        }

        let specific = info
            .current_challenges
            .iter()
            .filter(|c| is_specific_challenge(c))
            .count();
        if specific > 0 {
            need += 10;
            if specific >= 2 {
                need += 5;
            }
            reasons.push(format!("Described {} specific challenge(s)", specific));
        }

        // Authority
        if info.name.is_some() {
            authority += 5;
        }
        match info.role {
            Some(DecisionRole::DecisionMaker) => {
                authority += 10;
                reasons.push("Decision maker".to_string());
            }
            Some(role) => {
                authority += 5;
                reasons.push(format!("Role: {}", role.as_str()));
            }
            None => {}
        }

        let budget = info.budget.map(budget_points).unwrap_or(0);
        if let Some(range) = info.budget {
            reasons.push(format!("Budget {}", range.label()));
        }

        let timeline = info.timeline.map(timeline_points).unwrap_or(0);
        if let Some(t) = info.timeline {
            reasons.push(format!("Timeline {}", t.as_str()));
        }

        let total = (need + authority + budget + timeline).min(MAX_SCORE);
        let has_specific = specific > 0;
        let is_qualified = total >= self.qualified_score && info.has_contact() && has_specific;

        if !info.has_contact() {
            reasons.push("No contact channel".to_string());
        }
        if !has_specific {
            reasons.push("No specific challenge".to_string());
        }

        Qualification {
            budget_score: budget,
            authority_score: authority,
            need_score: need,
            timeline_score: timeline,
            total_score: total,
            is_qualified,
            tier: LeadTier::from_score_with_thresholds(total, &self.thresholds),
            reasons,
            qualified_at: Utc::now(),
        }
    }
}

fn budget_points(range: BudgetRange) -> u32 {
    match range {
        BudgetRange::Over250K => 15,
        BudgetRange::From100KTo250K => 10,
        BudgetRange::From50KTo100K => 6,
        BudgetRange::From10KTo50K => 3,
        BudgetRange::Under10K => 0,
    }
}

fn timeline_points(timeline: Timeline) -> u32 {
    match timeline {
        Timeline::Immediate => 15,
        Timeline::ThisMonth => 10,
        Timeline::ThisQuarter => 7,
        Timeline::NextQuarter | Timeline::ThisYear => 3,
        Timeline::Exploring => 0,
    }
}

/// One-line summary for the sales team
pub fn opportunity_summary(info: &CustomerInfo, qualification: &Qualification) -> String {
    let who = match (&info.name, &info.company) {
        (Some(name), Some(company)) => format!("{} at {}", name, company),
        (Some(name), None) => name.clone(),
        (None, Some(company)) => company.clone(),
        (None, None) => "Unnamed prospect".to_string(),
    };

    let mut parts = vec![format!(
        "{}: {} lead, score {}/100",
        who, qualification.tier, qualification.total_score
    )];
    if let Some(industry) = &info.industry {
        parts.push(format!("industry {}", industry));
    }
    if let Some(size) = info.company_size {
        parts.push(format!("{} company", size.as_str()));
    }
    if let Some(budget) = info.budget {
        parts.push(format!("budget {}", budget.label()));
    }
    if let Some(timeline) = info.timeline {
        parts.push(format!("timeline {}", timeline.as_str()));
    }
    if let Some(challenge) = info.current_challenges.first() {
        parts.push(format!("primary need: {}", challenge));
    }
    parts.join("; ")
}
