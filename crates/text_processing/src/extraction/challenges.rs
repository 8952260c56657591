//! Pain-point extraction

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

static PAIN_POINT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:need|needs|needed|struggl\w*|problem\w*|issue\w*|challeng\w*|pain\w*|slow\w*|manual\w*|backlog\w*|bottleneck\w*|delay\w*|error\w*|mistake\w*|inefficien\w*|costly|expensive|fraud\w*|too\s+long|takes\s+forever|hard\s+to|difficult\w*|losing|overwhelm\w*|frustrat\w*|automat\w*|can['’]?t\s+keep\s+up|behind|leak\w*|churn\w*|complain\w*|tedious|paperwork|by\s+hand)\b",
    )
    .unwrap()
});

static CLAUSE_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*;\s*|,\s+").unwrap());

const MIN_CHALLENGE_WORDS: usize = 3;
const MAX_CHALLENGE_CHARS: usize = 200;

/// Extract pain-point clauses, deduplicated in order of appearance
pub fn extract_challenges(text: &str) -> Vec<String> {
    let mut challenges: Vec<String> = Vec::new();

    for sentence in text.unicode_sentences() {
        for clause in CLAUSE_SEPARATOR.split(sentence) {
            let clause = clause
                .trim()
                .trim_end_matches(|c: char| matches!(c, '.' | '!' | '?' | ',' | ';' | ':'))
                .trim();

            if clause.split_whitespace().count() < MIN_CHALLENGE_WORDS {
                continue;
            }
            if !PAIN_POINT_PATTERN.is_match(clause) {
                continue;
            }

            let challenge: String = clause.chars().take(MAX_CHALLENGE_CHARS).collect();
            if !challenges.contains(&challenge) {
                challenges.push(challenge);
            }
        }
    }

    challenges
}
