// src/matching/scorer.rs - Pairwise client similarity (exact contact + fuzzy name)
use std::num::NonZeroUsize;

use crate::matching::memo::DistanceMemo;
use crate::models::ClientRecord;
use crate::utils::config::DEFAULT_SIMILARITY_THRESHOLD;

/// Why two records were (or were not) considered the same person.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchVerdict {
    ExactName,
    ExactContact,
    LengthRejected,
    EditDistance { similarity: f64 },
}

impl MatchVerdict {
    pub fn is_match(&self, threshold: f64) -> bool {
        match self {
            MatchVerdict::ExactName | MatchVerdict::ExactContact => true,
            MatchVerdict::LengthRejected => false,
            MatchVerdict::EditDistance { similarity } => *similarity >= threshold,
        }
    }
}

pub struct SimilarityScorer {
    threshold: f64,
    memo: DistanceMemo,
    comparisons: usize,
}

impl SimilarityScorer {
    pub fn new(threshold: f64, memo_capacity: NonZeroUsize) -> Self {
        Self {
            threshold,
            memo: DistanceMemo::new(memo_capacity),
            comparisons: 0,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// True when `a` and `b` plausibly describe the same person.
    pub fn similar(&mut self, a: &ClientRecord, b: &ClientRecord) -> bool {
        let threshold = self.threshold;
        self.verdict(a, b).is_match(threshold)
    }

    pub fn verdict(&mut self, a: &ClientRecord, b: &ClientRecord) -> MatchVerdict {
        self.comparisons += 1;

        let name_a = a.normalized_name();
        let name_b = b.normalized_name();
        if name_a == name_b {
            return MatchVerdict::ExactName;
        }

        // An identical contact number outweighs any name difference
        if let (Some(contact_a), Some(contact_b)) = (a.contact(), b.contact()) {
            if contact_a == contact_b {
                return MatchVerdict::ExactContact;
            }
        }

        let len_a = name_a.chars().count();
        let len_b = name_b.chars().count();
        let max_len = len_a.max(len_b);
        if max_len == 0 {
            return MatchVerdict::EditDistance { similarity: 1.0 };
        }
        let length_ratio = len_a.min(len_b) as f64 / max_len as f64;
        if length_ratio < self.threshold {
            return MatchVerdict::LengthRejected;
        }

        let distance = self
            .memo
            .get_or_compute(&name_a, &name_b, strsim::levenshtein);
        MatchVerdict::EditDistance {
            similarity: 1.0 - distance as f64 / max_len as f64,
        }
    }

    /// Number of pairs scored so far in this run.
    pub fn comparisons(&self) -> usize {
        self.comparisons
    }

    /// (hits, misses) of the edit distance memo.
    pub fn memo_stats(&self) -> (usize, usize) {
        self.memo.get_stats()
    }
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self::new(
            DEFAULT_SIMILARITY_THRESHOLD,
            NonZeroUsize::new(1024).unwrap_or(NonZeroUsize::MIN),
        )
    }
}

/// One-off comparison with a throwaway memo.
pub fn similar(a: &ClientRecord, b: &ClientRecord, threshold: f64) -> bool {
    SimilarityScorer::new(threshold, NonZeroUsize::MIN).similar(a, b)
}
