//! SimilarityStrategy: the contract candidate generators implement
//!
//! A strategy indexes the references it is shown and, given a new reference,
//! yields previously loaded references of the same entity that look alike.

use crate::model::{Entity, EntityError, Reference, SimilarityResult};
use async_trait::async_trait;
use thiserror::Error;

/// Candidates produced for one query; consumed once.
pub type Candidates = Box<dyn Iterator<Item = SimilarityResult> + Send>;

/// Errors local to one strategy. The pipeline logs them and moves on to the
/// next strategy.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("strategy backend error: {0}")]
    Backend(String),
    #[error("embedding failed: {0}")]
    Embedding(String),
    #[error("strategy backend unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Entity(#[from] EntityError),
}

pub type StrategyResult<T> = Result<T, StrategyError>;

/// A pluggable candidate generator.
///
/// Every yielded result has the queried reference as `reference1`, a
/// previously loaded reference as `reference2`, and exactly one strategy
/// label (this strategy's [`name`](SimilarityStrategy::name)) and score.
#[async_trait]
pub trait SimilarityStrategy: Send + Sync {
    /// Display name, used as the strategy label on results
    fn name(&self) -> &str;

    /// Index a reference so later queries for the same entity can find it.
    async fn load_reference(&self, entity: &Entity, reference: &Reference) -> StrategyResult<()>;

    /// Find loaded references similar to `reference`.
    async fn get_similar_references(
        &self,
        entity: &Entity,
        reference: &Reference,
    ) -> StrategyResult<Candidates>;
}
