//! refdedup: streaming deduplication of bibliographic references per author
//!
//! References arrive one at a time, each tagged with the person (entity) it
//! was harvested for. Every reference is compared against that person's
//! earlier references by pluggable similarity strategies; candidates are
//! either trivial duplicates (same DOI, same HAL id, same source id) or
//! potential duplicates left for human review. A plain-text report per
//! person groups them, and each potential pair gets a comparison record.
//!
//! # Example
//!
//! ```
//! use refdedup::{DedupPipeline, Entity, Reference, TitleSyntacticStrategy};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let pipeline = DedupPipeline::new().with_strategy(Arc::new(TitleSyntacticStrategy::default()));
//! let author = Entity::new("Jeanne Dupont").with_identifier("idref", "123");
//!
//! let first = Reference::new("hal", "hal-1").with_title("Deep learning for crystallography");
//! let second = Reference::new("scanR", "doi-1").with_title("Deep learning for crystallographie");
//! pipeline.process(author.clone(), first).await.unwrap();
//! pipeline.process(author, second).await.unwrap();
//!
//! let builder = pipeline.session().get("123").unwrap();
//! assert_eq!(builder.lock().await.get_potential_duplicates().len(), 1);
//! # });
//! ```

pub mod config;
pub mod dedup;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod sink;
pub mod strategy;

pub use config::{ConfigError, DedupConfig, SemanticConfig, SyntacticConfig};
pub use dedup::{
    normalize, CandidateAggregator, ExclusionFilter, PairExclusions, TrivialDuplicateClassifier,
};
pub use model::{Entity, EntityError, Reference, SimilarityResult};
pub use pipeline::{DedupPipeline, MessageOutcome, PipelineError, PipelineResult, ProcessedMessage};
pub use report::AuthorReportBuilder;
pub use sink::{ComparisonSink, JsonlComparisonSink, SinkError};
pub use strategy::{SimilarityStrategy, StrategyError, TitleSyntacticStrategy};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
