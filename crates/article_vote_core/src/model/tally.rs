//! Derived vote tallies.
//!
//! # Invariants
//! - `total_votes == positive_votes + negative_votes`.
//! - Percentages are 0 when there are no votes.
//! - Each percentage is rounded half-up on its own, so the pair may sum to
//!   101 (1 vs 7 gives 13 and 88).

use crate::model::article::Article;
use crate::model::vote::VoteRecord;
use serde::{Deserialize, Serialize};

/// Client-facing vote summary for one article.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallySnapshot {
    pub positive_votes: u64,
    pub negative_votes: u64,
    pub total_votes: u64,
    pub positive_percentage: u8,
    pub negative_percentage: u8,
}

impl TallySnapshot {
    /// Computes the snapshot for a pair of counters.
    pub fn from_counts(positive_votes: u64, negative_votes: u64) -> Self {
        let total_votes = positive_votes.saturating_add(negative_votes);
        Self {
            positive_votes,
            negative_votes,
            total_votes,
            positive_percentage: rounded_percentage(positive_votes, total_votes),
            negative_percentage: rounded_percentage(negative_votes, total_votes),
        }
    }

    pub fn from_record(record: &VoteRecord) -> Self {
        Self::from_counts(record.positive_votes, record.negative_votes)
    }
}

/// Returns `round(part / total * 100)` with half-up rounding, or 0 when
/// `total` is 0.
pub fn rounded_percentage(part: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let part = u128::from(part.min(total));
    let total = u128::from(total);
    // (200 * part + total) / (2 * total) == floor(100 * part / total + 0.5)
    let value = (200 * part + total) / (2 * total);
    // part <= total keeps value within 0..=100.
    value as u8
}

/// Admin statistics row for one article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleStats {
    pub article: Article,
    pub tally: TallySnapshot,
}
