//! Utterance signals used by the readiness gate

use once_cell::sync::Lazy;
use regex::Regex;

/// Words that on their own carry no information
const ACK_WORDS: &[&str] = &[
    "ok", "okay", "k", "sure", "yes", "yeah", "yep", "yup", "no", "nope", "nah", "thanks",
    "thank", "you", "thx", "hi", "hello", "hey", "there", "cool", "great", "got", "it",
    "sounds", "good", "fine", "alright", "right", "morning", "afternoon", "evening", "please",
    "perfect", "awesome", "nice", "hmm", "uh", "um", "oh", "ah", "i", "see", "makes", "sense",
];

/// Challenge phrases too vague to act on
const GENERIC_CHALLENGES: &[&str] = &[
    "need help",
    "help",
    "improve efficiency",
    "be more efficient",
    "more efficiency",
    "increase efficiency",
    "efficiency",
    "save money",
    "save time",
    "reduce costs",
    "cut costs",
    "lower costs",
    "improve productivity",
    "grow the business",
    "grow our business",
    "streamline operations",
    "streamline things",
    "improve our process",
    "improve our processes",
    "looking for a solution",
    "need a solution",
    "automation",
    "automate things",
    "digital transformation",
    "modernize",
    "not sure",
];

/// Leading filler stripped before comparing against the generic list
const CHALLENGE_FILLERS: &[&str] = &[
    "we", "i", "just", "really", "want", "wanted", "to", "would", "like", "are", "am",
    "looking", "basically", "mainly", "mostly",
];

static SIGNOFF_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:thanks|thank\s+you|thx|goodbye|good\s*bye|bye|that'?s\s+all|that\s+is\s+all|talk\s+(?:to\s+you\s+)?(?:soon|later)|have\s+a\s+(?:good|great|nice)\s+(?:day|one|week)|cheers|signing\s+off)\b",
    )
    .unwrap()
});

/// Count whitespace-separated words containing at least one alphanumeric
pub fn word_count(text: &str) -> usize {
    text.split_whitespace()
        .filter(|w| w.chars().any(|c| c.is_alphanumeric()))
        .count()
}

fn normalized_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric() || *c == '\'')
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

/// A turn with at least two words that is not a bare acknowledgement or greeting
pub fn is_substantive(text: &str) -> bool {
    let words = normalized_words(text);
    if words.len() < 2 {
        return false;
    }
    words
        .iter()
        .map(|w| w.trim_matches('\''))
        .any(|w| !ACK_WORDS.contains(&w))
}

/// Whether the message contains an explicit conversation sign-off
pub fn is_signoff(text: &str) -> bool {
    SIGNOFF_PATTERN.is_match(text)
}

/// Whether a challenge phrase is on the generic list
pub fn is_generic_challenge(text: &str) -> bool {
    let words = normalized_words(text);
    let full = words.join(" ");
    if GENERIC_CHALLENGES.contains(&full.as_str()) {
        return true;
    }

    let start = words
        .iter()
        .position(|w| !CHALLENGE_FILLERS.contains(&w.as_str()))
        .unwrap_or(words.len());
    let stripped = words[start..].join(" ");
    GENERIC_CHALLENGES.contains(&stripped.as_str())
}

/// At least three words and not generic
pub fn is_specific_challenge(text: &str) -> bool {
    word_count(text) >= 3 && !is_generic_challenge(text)
}
