//! Scoring rule for search results
//!
//! Every matched occurrence carries a weight:
//! - exact word or phrase: 1.0
//! - fuzzy match at edit distance d: 1 / (1 + d)
//! - prefix match on a longer word: 0.75
//!
//! An occurrence in a document with `n` matched occurrences scores
//! `weight * (1 + ln n)`. Ties are broken by ascending key, then offset.

use crate::index::types::{DocKey, SearchMatch};
use std::cmp::Ordering;

pub const EXACT_WEIGHT: f32 = 1.0;
pub const PREFIX_WEIGHT: f32 = 0.75;

pub fn fuzzy_weight(distance: usize) -> f32 {
    1.0 / (1.0 + distance as f32)
}

/// Score of one occurrence among `matched` in the same document
pub fn score(weight: f32, matched: usize) -> f32 {
    weight * (1.0 + (matched.max(1) as f32).ln())
}

/// A scored match, ordered so that the best result is the greatest
#[derive(Debug, Clone)]
pub struct Ranked {
    pub score: f32,
    pub key: DocKey,
    pub offset: u32,
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.key.cmp(&self.key))
            .then_with(|| other.offset.cmp(&self.offset))
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl From<Ranked> for SearchMatch {
    fn from(r: Ranked) -> Self {
        SearchMatch {
            key: r.key,
            offset: r.offset,
            score: r.score,
        }
    }
}
