//! Lead qualification record and tiers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lead tier derived from total score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadTier {
    /// Below viable; goes to nurture
    Nurture,
    /// Worth a follow-up
    Viable,
    /// Meets the sales bar
    Qualified,
    /// Strong interest, clear need
    Warm,
    /// Ready to buy
    Hot,
}

/// Minimum scores for each tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    pub hot: u32,
    pub warm: u32,
    pub qualified: u32,
    pub viable: u32,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            hot: 80,
            warm: 60,
            qualified: 45,
            viable: 30,
        }
    }
}

impl LeadTier {
    /// Create from score using default thresholds
    pub fn from_score(score: u32) -> Self {
        Self::from_score_with_thresholds(score, &TierThresholds::default())
    }

    /// Create from score using configured thresholds
    pub fn from_score_with_thresholds(score: u32, thresholds: &TierThresholds) -> Self {
        if score >= thresholds.hot {
            LeadTier::Hot
        } else if score >= thresholds.warm {
            LeadTier::Warm
        } else if score >= thresholds.qualified {
            LeadTier::Qualified
        } else if score >= thresholds.viable {
            LeadTier::Viable
        } else {
            LeadTier::Nurture
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadTier::Hot => "hot",
            LeadTier::Warm => "warm",
            LeadTier::Qualified => "qualified",
            LeadTier::Viable => "viable",
            LeadTier::Nurture => "nurture",
        }
    }
}

impl std::fmt::Display for LeadTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// BANT-style qualification result, computed once per session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Qualification {
    /// Budget points
    pub budget_score: u32,
    /// Name and role points
    pub authority_score: u32,
    /// Contact, business and challenge points
    pub need_score: u32,
    /// Timeline points
    pub timeline_score: u32,
    /// Sum of all points, clamped to 100
    pub total_score: u32,
    pub is_qualified: bool,
    pub tier: LeadTier,
    /// Human-readable scoring reasons in evaluation order
    pub reasons: Vec<String>,
    pub qualified_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(LeadTier::from_score(0), LeadTier::Nurture);
        assert_eq!(LeadTier::from_score(29), LeadTier::Nurture);
        assert_eq!(LeadTier::from_score(30), LeadTier::Viable);
        assert_eq!(LeadTier::from_score(45), LeadTier::Qualified);
        assert_eq!(LeadTier::from_score(60), LeadTier::Warm);
        assert_eq!(LeadTier::from_score(80), LeadTier::Hot);
        assert_eq!(LeadTier::from_score(100), LeadTier::Hot);
    }

    #[test]
    fn test_tier_monotonic_in_score() {
        let mut previous = LeadTier::from_score(0);
        for score in 1..=100 {
            let tier = LeadTier::from_score(score);
            assert!(tier >= previous, "tier dropped at score {}", score);
            previous = tier;
        }
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = TierThresholds {
            hot: 90,
            warm: 70,
            qualified: 50,
            viable: 20,
        };
        assert_eq!(
            LeadTier::from_score_with_thresholds(85, &thresholds),
            LeadTier::Warm
        );
        assert_eq!(
            LeadTier::from_score_with_thresholds(25, &thresholds),
            LeadTier::Viable
        );
    }
}
