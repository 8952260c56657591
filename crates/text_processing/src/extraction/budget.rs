//! Budget extraction
//!
//! Amounts are only read when the message talks about budget, and the
//! amount closest to the budget wording wins.

use lead_agent_core::BudgetRange;
use once_cell::sync::Lazy;
use regex::Regex;

static BUDGET_CONTEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:budget|budgeted|spend|spending|invest|investing|investment|afford|allocated|allocate)\b")
        .unwrap()
});

static AMOUNT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\$\s?(?P<dollars>\d+(?:,\d{3})*(?:\.\d+)?)(?:\s*(?P<dmult>k|mm|m|thousand|million|b|billion)\b)?|\b(?P<plain>\d+(?:\.\d+)?)\s*(?P<pmult>k|thousand|million|m)\b",
    )
    .unwrap()
});

/// Amount multiplier for parsing
#[derive(Debug, Clone, Copy)]
enum AmountMultiplier {
    Unit,
    Thousand,
    Million,
    Billion,
}

impl AmountMultiplier {
    fn parse(suffix: Option<&str>) -> Self {
        match suffix.map(|s| s.to_lowercase()).as_deref() {
            Some("k") | Some("thousand") => AmountMultiplier::Thousand,
            Some("m") | Some("mm") | Some("million") => AmountMultiplier::Million,
            Some("b") | Some("billion") => AmountMultiplier::Billion,
            _ => AmountMultiplier::Unit,
        }
    }

    fn value(&self) -> f64 {
        match self {
            AmountMultiplier::Unit => 1.0,
            AmountMultiplier::Thousand => 1_000.0,
            AmountMultiplier::Million => 1_000_000.0,
            AmountMultiplier::Billion => 1_000_000_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct AmountMatch {
    start: usize,
    end: usize,
    amount: u64,
}

fn find_amounts(text: &str) -> Vec<AmountMatch> {
    AMOUNT_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let (number, suffix) = match caps.name("dollars") {
                Some(d) => (d.as_str(), caps.name("dmult").map(|m| m.as_str())),
                None => (
                    caps.name("plain")?.as_str(),
                    caps.name("pmult").map(|m| m.as_str()),
                ),
            };
            let value: f64 = number.replace(',', "").parse().ok()?;
            let amount = (value * AmountMultiplier::parse(suffix).value()).round();
            if amount <= 0.0 {
                return None;
            }
            Some(AmountMatch {
                start: whole.start(),
                end: whole.end(),
                amount: amount as u64,
            })
        })
        .collect()
}

/// Extract a budget as (bucket, normalized dollars)
pub fn extract_budget(text: &str) -> Option<(BudgetRange, u64)> {
    let contexts: Vec<(usize, usize)> = BUDGET_CONTEXT
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect();
    if contexts.is_empty() {
        return None;
    }

    let distance = |amount: &AmountMatch| -> (usize, bool) {
        contexts
            .iter()
            .map(|&(start, end)| {
                if amount.start >= end {
                    (amount.start - end, false)
                } else if amount.end <= start {
                    (start - amount.end, true)
                } else {
                    (0, false)
                }
            })
            .min()
            .unwrap_or((usize::MAX, true))
    };

    let best = find_amounts(text).into_iter().min_by_key(distance)?;
    tracing::debug!(amount = best.amount, "Extracted budget amount");

    Some((BudgetRange::from_amount(best.amount), best.amount))
}
