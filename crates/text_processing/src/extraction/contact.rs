//! Email and phone extraction

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,}\b").unwrap()
});

// Checked in order: US with punctuation, plain digit groups, international prefix
static PHONE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?:\+?1[\-.\s]?)?\(?\b\d{3}\)?[\-.\s]?\d{3}[\-.\s]\d{4}\b").unwrap(),
        Regex::new(r"\b\d{3}\s?\d{3}\s?\d{4}\b").unwrap(),
        Regex::new(r"\+\d{1,3}[\-.\s]?(?:\(?\d{1,4}\)?[\-.\s]?){2,5}\d{2,4}\b").unwrap(),
    ]
});

const MIN_PHONE_DIGITS: usize = 10;
const MAX_PHONE_DIGITS: usize = 15;

/// Extract an email address, lowercased
pub fn extract_email(text: &str) -> Option<String> {
    let candidate = EMAIL_PATTERN.find(text)?.as_str().trim_end_matches('.');
    let email = candidate.to_lowercase();

    let (_, domain) = email.split_once('@')?;
    if domain.contains('.') {
        Some(email)
    } else {
        None
    }
}

/// Extract a phone number, normalized to digits
///
/// International numbers keep a leading `+`.
pub fn extract_phone(text: &str) -> Option<String> {
    for pattern in PHONE_PATTERNS.iter() {
        for m in pattern.find_iter(text) {
            let raw = m.as_str().trim();
            let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

            if digits.len() < MIN_PHONE_DIGITS || digits.len() > MAX_PHONE_DIGITS {
                tracing::trace!(candidate = raw, "Skipping phone candidate with bad digit count");
                continue;
            }

            if raw.starts_with('+') {
                return Some(format!("+{}", digits));
            }
            return Some(digits);
        }
    }

    None
}
