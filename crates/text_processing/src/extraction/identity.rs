//! Name, job title and decision role extraction

use lead_agent_core::DecisionRole;
use once_cell::sync::Lazy;
use regex::Regex;

// Explicit introductions: any casing accepted
static EXPLICIT_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:my\s+name\s+is|my\s+name's|name's|call\s+me)\s+([a-z][a-z'’\-]*(?:\s+[a-z][a-z'’\-]*){0,3})",
    )
    .unwrap()
});

// Loose introductions: the name token must be capitalized so that
// "I'm looking for..." does not produce a name
static INTRO_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:[Ii]['’]m|[Ii]\s+am|[Tt]his\s+is)\s+([A-Z][a-zA-Z'’\-]*(?:\s+[A-Z][a-zA-Z'’\-]*){0,2})",
    )
    .unwrap()
});

const GREETINGS: &[&str] = &["hi", "hello", "hey", "hiya", "greetings"];

/// Tokens that end a name
const NAME_TERMINATORS: &[&str] = &[
    "and", "from", "with", "at", "of", "the", "a", "an", "here", "i", "i'm", "im", "we",
    "our", "my", "in", "on", "for", "to", "by", "but", "so", "just", "speaking", "calling",
    "vp", "svp", "evp", "ceo", "cto", "cfo", "coo", "cio", "cmo", "founder", "owner",
    "president", "director", "manager", "head", "lead", "engineer", "analyst",
];

/// First tokens that mean the phrase is not a name
const NOT_NAMES: &[&str] = &[
    "looking", "interested", "calling", "just", "here", "trying", "not", "very", "really",
    "so", "the", "a", "an", "in", "on", "with", "from", "at", "tomorrow", "today", "later",
    "back", "sure", "glad", "happy", "curious", "new", "currently", "working", "responsible",
    "wondering", "thinking", "hoping", "good", "fine", "great", "ok", "okay",
];

const LEGAL_SUFFIXES: &[&str] = &[
    "llc", "inc", "corp", "corporation", "ltd", "limited", "co", "group", "gmbh", "plc", "llp",
];

const MIN_NAME_LEN: usize = 3;
const MAX_NAME_LEN: usize = 50;

/// Extract the speaker's name from a self-introduction
pub fn extract_name(text: &str) -> Option<String> {
    for pattern in [&*EXPLICIT_NAME_PATTERN, &*INTRO_NAME_PATTERN] {
        for caps in pattern.captures_iter(text) {
            let Some(m) = caps.get(1) else { continue };
            if let Some(name) = clean_name(m.as_str()) {
                return Some(name);
            }
        }
    }
    None
}

fn clean_name(raw: &str) -> Option<String> {
    let mut tokens: Vec<&str> = raw.split_whitespace().collect();

    while tokens
        .first()
        .map(|t| GREETINGS.contains(&t.to_lowercase().as_str()))
        .unwrap_or(false)
    {
        tokens.remove(0);
    }

    let first = tokens.first()?.to_lowercase();
    if NOT_NAMES.contains(&first.as_str()) {
        return None;
    }

    let end = tokens
        .iter()
        .position(|t| NAME_TERMINATORS.contains(&t.to_lowercase().as_str()))
        .unwrap_or(tokens.len());
    let tokens = &tokens[..end];

    let last = tokens.last()?.to_lowercase();
    if LEGAL_SUFFIXES.contains(&last.trim_end_matches('.')) {
        return None;
    }

    let name = tokens
        .iter()
        .map(|t| title_case(t))
        .collect::<Vec<_>>()
        .join(" ");

    if name.contains('@') || name.len() < MIN_NAME_LEN || name.len() >= MAX_NAME_LEN {
        return None;
    }
    Some(name)
}

fn title_case(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

static TITLE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\bchief\s+[a-z]+\s+officer\b").unwrap(),
        Regex::new(r"(?i)\b(?:ceo|cto|cfo|coo|cio|ciso|cmo|cro)\b").unwrap(),
        Regex::new(r"(?i)\b(?:co-?)?founder\b").unwrap(),
        Regex::new(r"(?i)\b(?:(?:senior|executive|sr\.?)\s+)?(?:vice\s+president|svp|evp|vp)(?:\s+of\s+[a-z]+(?:\s+[a-z]+)?)?")
            .unwrap(),
        Regex::new(r"(?i)\bpresident\b").unwrap(),
        Regex::new(r"(?i)\b(?:business|company|agency)\s+owner\b|\bowner\s+of\b").unwrap(),
        Regex::new(r"(?i)\b(?:managing|senior|founding)\s+partner\b|\bi['’]?m\s+a\s+partner\b").unwrap(),
        Regex::new(r"(?i)\b(?:(?:senior|managing|executive)\s+)?director(?:\s+of\s+[a-z]+(?:\s+[a-z]+)?)?").unwrap(),
        Regex::new(r"(?i)\bhead\s+of\s+[a-z]+(?:\s+[a-z]+)?").unwrap(),
        Regex::new(r"(?i)\b(?:[a-z]+\s+)?manager\b").unwrap(),
        Regex::new(r"(?i)\b(?:team|tech|technical)\s+lead\b").unwrap(),
        Regex::new(r"(?i)\b(?:[a-z]+\s+)?(?:analyst|engineer|consultant|specialist|coordinator|administrator|adjuster|underwriter)\b")
            .unwrap(),
    ]
});

/// Words trimmed from either end of a matched title
const TITLE_EDGE_STOPWORDS: &[&str] = &[
    "at", "for", "with", "in", "and", "from", "on", "the", "a", "an", "our", "my", "i'm", "im",
    "as", "of", "is", "am", "was", "we", "i", "to", "here",
];

/// Extract a job title; the earliest mention in the text wins
pub fn extract_title(text: &str) -> Option<String> {
    let earliest = TITLE_PATTERNS
        .iter()
        .filter_map(|pattern| pattern.find(text))
        .min_by_key(|m| (m.start(), std::cmp::Reverse(m.end())))?;

    let tokens: Vec<&str> = earliest.as_str().split_whitespace().collect();
    let is_stop = |t: &&str| TITLE_EDGE_STOPWORDS.contains(&t.to_lowercase().as_str());

    let start = tokens.iter().position(|t| !is_stop(t))?;
    let end = tokens.iter().rposition(|t| !is_stop(t))? + 1;
    if start >= end {
        return None;
    }

    Some(tokens[start..end].join(" "))
}

/// Map a job title onto its buying authority
pub fn role_for_title(title: &str) -> DecisionRole {
    let lower = title.to_lowercase();
    let has_word = |word: &str| lower.split(|c: char| !c.is_alphanumeric()).any(|w| w == word);

    if lower.contains("vice president") || has_word("vp") || has_word("svp") || has_word("evp") {
        return DecisionRole::Influencer;
    }

    let c_level = ["ceo", "cto", "cfo", "coo", "cio", "ciso", "cmo", "cro"];
    if lower.contains("chief")
        || c_level.iter().any(|w| has_word(w))
        || lower.contains("founder")
        || has_word("owner")
        || has_word("president")
        || has_word("partner")
    {
        return DecisionRole::DecisionMaker;
    }

    if has_word("director") || has_word("head") || has_word("manager") || has_word("lead") {
        return DecisionRole::Influencer;
    }

    DecisionRole::Researcher
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_name_any_case() {
        assert_eq!(
            extract_name("my name is jane doe and I run claims"),
            Some("Jane Doe".to_string())
        );
        assert_eq!(extract_name("Call me Bob."), Some("Bob".to_string()));
    }

    #[test]
    fn test_intro_requires_capital() {
        assert_eq!(
            extract_name("Hi, I'm John Smith, VP of Engineering"),
            Some("John Smith".to_string())
        );
        assert_eq!(extract_name("I'm looking for claims automation"), None);
        assert_eq!(extract_name("this is great stuff"), None);
    }

    #[test]
    fn test_name_rejections() {
        // Too short
        assert_eq!(extract_name("call me Al"), None);
        // Company, not a person
        assert_eq!(extract_name("This is Acme Corp calling"), None);
        assert_eq!(extract_name("I'm interested in a demo"), None);
    }

    #[test]
    fn test_title_earliest_wins() {
        assert_eq!(
            extract_title("I'm John Smith, VP of Engineering at Acme Corp"),
            Some("VP of Engineering".to_string())
        );
        assert_eq!(
            extract_title("I'm the claims manager, reporting to our CFO"),
            Some("claims manager".to_string())
        );
    }

    #[test]
    fn test_role_mapping() {
        assert_eq!(role_for_title("CEO"), DecisionRole::DecisionMaker);
        assert_eq!(role_for_title("Co-Founder"), DecisionRole::DecisionMaker);
        assert_eq!(role_for_title("Managing Partner"), DecisionRole::DecisionMaker);
        assert_eq!(role_for_title("VP of Engineering"), DecisionRole::Influencer);
        assert_eq!(role_for_title("Vice President of Claims"), DecisionRole::Influencer);
        assert_eq!(role_for_title("Director of Operations"), DecisionRole::Influencer);
        assert_eq!(role_for_title("claims manager"), DecisionRole::Influencer);
        assert_eq!(role_for_title("Business Analyst"), DecisionRole::Researcher);
    }
}
