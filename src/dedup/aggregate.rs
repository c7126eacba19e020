//! Candidate aggregation across similarity strategies
//!
//! Raw results for one source reference arrive strategy by strategy. They are
//! filtered for noise, then merged per target reference: the first result
//! seen for a target is kept and later ones append their strategy labels and
//! scores onto it.

use super::noise::identifiers_from_same_source;
use super::pair_rules::PairExclusions;
use crate::model::SimilarityResult;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Merged results keyed by the candidate's unique identifier
pub type MergedCandidates = BTreeMap<String, SimilarityResult>;

/// Why a raw result was dropped before merging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// The candidate is the source reference itself
    SelfPair,
    /// The pair was already classified as a trivial duplicate
    TrivialDuplicate,
    /// The candidate republishes the source reference from another harvester
    SameSource,
    /// A configured pair exclusion rule rejected it
    Excluded(String),
}

/// Merges raw strategy results sharing the same `reference1`.
pub struct CandidateAggregator<'a> {
    exclusions: &'a PairExclusions,
    trivial_pairs: &'a BTreeSet<(String, String)>,
}

impl<'a> CandidateAggregator<'a> {
    /// `trivial_pairs` holds unordered pairs of unique identifiers; either
    /// orientation of a pair is recognised.
    pub fn new(exclusions: &'a PairExclusions, trivial_pairs: &'a BTreeSet<(String, String)>) -> Self {
        Self {
            exclusions,
            trivial_pairs,
        }
    }

    /// Check a single raw result against the noise filters.
    pub fn drop_reason(&self, result: &SimilarityResult) -> Option<DropReason> {
        let source = result.reference1.unique_identifier();
        let target = result.target_key();
        if source == target {
            return Some(DropReason::SelfPair);
        }
        if self.is_trivial(&source, &target) {
            return Some(DropReason::TrivialDuplicate);
        }
        if identifiers_from_same_source(&result.reference1, &result.reference2) {
            return Some(DropReason::SameSource);
        }
        self.exclusions
            .matching_rule(&result.reference1, &result.reference2)
            .map(|rule| DropReason::Excluded(rule.to_string()))
    }

    /// Filter and merge results by target; arrival order decides label order.
    pub fn aggregate(&self, results: impl IntoIterator<Item = SimilarityResult>) -> MergedCandidates {
        let mut merged = MergedCandidates::new();
        for result in results {
            if let Some(reason) = self.drop_reason(&result) {
                debug!(
                    source = %result.reference1.unique_identifier(),
                    target = %result.target_key(),
                    ?reason,
                    "candidate dropped"
                );
                continue;
            }
            let key = result.target_key();
            match merged.get_mut(&key) {
                Some(existing) => existing.absorb(result),
                None => {
                    merged.insert(key, result);
                }
            }
        }
        merged
    }

    fn is_trivial(&self, a: &str, b: &str) -> bool {
        let forward = (a.to_string(), b.to_string());
        let backward = (b.to_string(), a.to_string());
        self.trivial_pairs.contains(&forward) || self.trivial_pairs.contains(&backward)
    }
}
