//! SimilarityResult: a scored candidate pairing between two references

use super::reference::Reference;
use serde::Serialize;

/// A candidate pairing produced by one or more similarity strategies.
///
/// `similarity_strategies` and `scores` are index-aligned: the score at
/// position `i` was produced by the strategy labelled at position `i`.
/// The fields are private so the alignment cannot be broken from outside.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityResult {
    pub reference1: Reference,
    pub reference2: Reference,
    similarity_strategies: Vec<String>,
    scores: Vec<f64>,
}

impl SimilarityResult {
    /// A single-strategy result, as emitted by a strategy.
    pub fn new(
        reference1: Reference,
        reference2: Reference,
        strategy: impl Into<String>,
        score: f64,
    ) -> Self {
        Self {
            reference1,
            reference2,
            similarity_strategies: vec![strategy.into()],
            scores: vec![score],
        }
    }

    pub fn similarity_strategies(&self) -> &[String] {
        &self.similarity_strategies
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    /// Key of the candidate side, used to aggregate results per target
    pub fn target_key(&self) -> String {
        self.reference2.unique_identifier()
    }

    /// Append another result's strategy labels and scores, keeping alignment.
    pub fn absorb(&mut self, other: SimilarityResult) {
        self.similarity_strategies.extend(other.similarity_strategies);
        self.scores.extend(other.scores);
    }

    /// `strategy (score)` pairs, for display
    pub fn labelled_scores(&self) -> Vec<String> {
        self.similarity_strategies
            .iter()
            .zip(&self.scores)
            .map(|(strategy, score)| format!("{} ({})", strategy, score))
            .collect()
    }
}
