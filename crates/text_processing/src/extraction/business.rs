//! Company, industry and company-size extraction

use once_cell::sync::Lazy;
use regex::Regex;

// Capitalized name followed by a legal-entity suffix
static LEGAL_ENTITY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b((?:[A-Z0-9][\w&'’\-]*\s+){0,3}?[A-Z0-9][\w&'’\-]*)\s+(LLC|Inc|Corp|Corporation|Ltd|Limited|Co|Group|GmbH|PLC|LLP)\b\.?",
    )
    .unwrap()
});

static WORKPLACE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i:\bi['’]m\s+with|\bi\s+am\s+with|\bi\s+work\s+(?:at|for)|\bi['’]m\s+at|\bi\s+run)\s+([A-Za-z0-9][\w&'’\-]*(?:\s+[A-Z0-9][\w&'’\-]*){0,3})",
    )
    .unwrap()
});

static GENERIC_POSSESSIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:my|our)\s+(?:own\s+|small\s+|little\s+)?(?:business|company|firm|agency|shop|startup|practice)\b")
        .unwrap()
});

static NAMED_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i:\bcalled|\bnamed)\s+([A-Z0-9][\w&'’\-]*(?:\s+[A-Z0-9][\w&'’\-]*){0,3})").unwrap()
});

/// Leading words that are sentence furniture rather than part of a name
const LEADING_NOISE: &[&str] = &[
    "the", "at", "our", "we", "i", "with", "for", "from", "of", "and", "in", "hi", "hello",
    "hey", "so", "but", "also", "here", "my",
];

/// Words that make a workplace phrase generic
const GENERIC_WORKPLACE: &[&str] = &[
    "my", "our", "a", "an", "the", "myself", "home", "family", "this", "that", "some", "it",
];

/// Extract the company name
pub fn extract_company(text: &str) -> Option<String> {
    if let Some(caps) = LEGAL_ENTITY_PATTERN.captures(text) {
        let base = strip_leading_noise(caps.get(1).map(|m| m.as_str()).unwrap_or(""));
        let suffix = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        if !base.is_empty() {
            return Some(format!("{} {}", base, suffix));
        }
    }

    if GENERIC_POSSESSIVE.is_match(text) {
        if let Some(name) = NAMED_PATTERN
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
        {
            return Some(name);
        }
    }

    for caps in WORKPLACE_PATTERN.captures_iter(text) {
        let Some(m) = caps.get(1) else { continue };
        let candidate = m.as_str().trim();
        let first = candidate
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_lowercase();

        if GENERIC_WORKPLACE.contains(&first.as_str()) {
            tracing::trace!(candidate, "Rejecting generic workplace phrase");
            continue;
        }
        if !candidate.starts_with(|c: char| c.is_uppercase() || c.is_ascii_digit()) {
            continue;
        }
        return Some(candidate.to_string());
    }

    None
}

fn strip_leading_noise(name: &str) -> String {
    let tokens: Vec<&str> = name.split_whitespace().collect();
    let start = tokens
        .iter()
        .position(|t| !LEADING_NOISE.contains(&t.to_lowercase().as_str()))
        .unwrap_or(tokens.len());
    tokens[start..].join(" ")
}

/// Industry vocabulary: (canonical, surface terms)
const INDUSTRIES: &[(&str, &[&str])] = &[
    ("insurance", &["insurance", "insurer", "insurtech", "underwriting", "reinsurance"]),
    ("healthcare", &["healthcare", "health care", "medical", "hospital", "clinic"]),
    ("finance", &["finance", "financial services", "fintech", "banking", "bank", "lending"]),
    ("retail", &["retail", "e-commerce", "ecommerce"]),
    ("manufacturing", &["manufacturing", "manufacturer"]),
    ("technology", &["technology", "software", "saas", "tech"]),
    ("logistics", &["logistics", "shipping", "transportation", "freight"]),
    ("real_estate", &["real estate", "property management"]),
    ("education", &["education", "edtech", "university"]),
    ("legal", &["legal", "law firm"]),
    ("government", &["government", "public sector"]),
    ("telecommunications", &["telecommunications", "telecom"]),
    ("energy", &["energy", "utilities", "utility"]),
    ("hospitality", &["hospitality", "hotel"]),
    ("automotive", &["automotive", "auto dealer"]),
];

static INDUSTRY_CONTEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:industry|sector|company|business|space|field|firm|vertical)\b").unwrap()
});

static INDUSTRY_TERMS: Lazy<Vec<(Regex, &'static str, &'static str)>> = Lazy::new(|| {
    INDUSTRIES
        .iter()
        .flat_map(|(canonical, terms)| {
            terms.iter().map(move |term| {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(term));
                (Regex::new(&pattern).unwrap(), *canonical, *term)
            })
        })
        .collect()
});

/// Extract an industry from the fixed vocabulary
///
/// Requires an industry context word in the same message. A finance term
/// that is part of the company name is ignored.
pub fn extract_industry(text: &str) -> Option<String> {
    if !INDUSTRY_CONTEXT.is_match(text) {
        return None;
    }

    let company = extract_company(text).map(|c| c.to_lowercase());

    INDUSTRY_TERMS
        .iter()
        .filter_map(|(pattern, canonical, term)| {
            let m = pattern.find(text)?;
            let inside_company = *canonical == "finance"
                && company
                    .as_deref()
                    .map(|c| c.contains(&term.to_lowercase()))
                    .unwrap_or(false);
            if inside_company {
                None
            } else {
                Some((m.start(), *canonical))
            }
        })
        .min_by_key(|(start, _)| *start)
        .map(|(_, canonical)| canonical.to_string())
}

static EMPLOYEE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\b(\d{1,3}(?:,\d{3})+|\d+)\s*\+?\s*(?:employees|people|staff|workers|ftes?|headcount)\b")
            .unwrap(),
        Regex::new(r"(?i)\bteam\s+of\s+(\d{1,3}(?:,\d{3})+|\d+)\b").unwrap(),
        Regex::new(r"(?i)\b(?:headcount|employ)\s+(?:of\s+|is\s+|about\s+|around\s+)*(\d{1,3}(?:,\d{3})+|\d+)\b")
            .unwrap(),
    ]
});

/// Extract the number of employees
pub fn extract_employee_count(text: &str) -> Option<u32> {
    EMPLOYEE_PATTERNS.iter().find_map(|pattern| {
        let caps = pattern.captures(text)?;
        caps.get(1)?.as_str().replace(',', "").parse::<u32>().ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_entity_company() {
        assert_eq!(
            extract_company("Hi, I'm John Smith, VP of Engineering at Acme Corp"),
            Some("Acme Corp".to_string())
        );
        assert_eq!(
            extract_company("We are Blue Harbor Mutual Group, a regional carrier"),
            Some("Blue Harbor Mutual Group".to_string())
        );
    }

    #[test]
    fn test_workplace_phrase() {
        assert_eq!(
            extract_company("I work at Northwind and handle claims"),
            Some("Northwind".to_string())
        );
        assert_eq!(
            extract_company("I'm with Contoso Health"),
            Some("Contoso Health".to_string())
        );
    }

    #[test]
    fn test_generic_possessive() {
        assert_eq!(extract_company("I work for my business"), None);
        assert_eq!(
            extract_company("I run my own business called Apex Adjusting"),
            Some("Apex Adjusting".to_string())
        );
    }

    #[test]
    fn test_industry_requires_context() {
        assert_eq!(
            extract_industry("We're an insurance company in Ohio"),
            Some("insurance".to_string())
        );
        assert_eq!(extract_industry("I read about insurance"), None);
    }

    #[test]
    fn test_finance_inside_company_name_skipped() {
        assert_eq!(
            extract_industry("I work at Summit Finance LLC, a logistics business"),
            Some("logistics".to_string())
        );
    }

    #[test]
    fn test_employee_count() {
        assert_eq!(extract_employee_count("we have 1,200 employees"), Some(1200));
        assert_eq!(extract_employee_count("a team of 45 adjusters"), Some(45));
        assert_eq!(extract_employee_count("no numbers here"), None);
    }
}
