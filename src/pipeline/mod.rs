//! DedupPipeline: runs one (entity, reference) message through the
//! deduplication flow
//!
//! Steps, per message:
//! 1. Exclusion filter (discarded references stop here)
//! 2. Contributor defaulting and last-name computation
//! 3. Each strategy, in order: load the reference, then query candidates
//! 4. Trivial-duplicate classification of every candidate
//! 5. Aggregation of the remaining candidates per target
//! 6. Report state update, comparison records, report dump
//!
//! A failing strategy is logged and skipped; the message carries on with
//! the others.

mod message;
mod session;

pub use message::{InboundMessage, ReferenceEvent};
pub use session::{DedupSession, SharedBuilder};

use crate::config::DedupConfig;
use crate::dedup::{
    CandidateAggregator, ExclusionFilter, PairExclusions, PairRuleError, TrivialDuplicateClassifier,
};
use crate::model::{Contribution, Contributor, Entity, EntityError, Reference, SimilarityResult};
use crate::report::{ordered_pair, IdPair};
use crate::sink::{ComparisonSink, SinkError};
use crate::strategy::SimilarityStrategy;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Entity(#[from] EntityError),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error(transparent)]
    PairRule(#[from] PairRuleError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// What processing one message produced
#[derive(Debug, Clone)]
pub struct ProcessedMessage {
    pub main_entity_id: String,
    /// The reference as stored, after contributor defaulting
    pub reference: Reference,
    /// Pairs classified as trivial duplicates by this message
    pub trivial_pairs: Vec<IdPair>,
    /// Merged potential duplicates, ordered by target
    pub potential: Vec<SimilarityResult>,
}

#[derive(Debug, Clone)]
pub enum MessageOutcome {
    /// The exclusion filter dropped the reference
    Discarded { rule: String },
    Processed(ProcessedMessage),
}

pub struct DedupPipeline {
    session: DedupSession,
    strategies: Vec<Arc<dyn SimilarityStrategy>>,
    exclusion_filter: ExclusionFilter,
    pair_exclusions: PairExclusions,
    classifier: TrivialDuplicateClassifier,
    comparison_sink: Option<Arc<dyn ComparisonSink>>,
    report_dir: Option<PathBuf>,
}

impl Default for DedupPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl DedupPipeline {
    /// A pipeline with the default exclusion filter, no strategies, no pair
    /// exclusions and no outputs.
    pub fn new() -> Self {
        Self {
            session: DedupSession::new(),
            strategies: Vec::new(),
            exclusion_filter: ExclusionFilter::default(),
            pair_exclusions: PairExclusions::none(),
            classifier: TrivialDuplicateClassifier::new(),
            comparison_sink: None,
            report_dir: None,
        }
    }

    /// Pair exclusions and report directory taken from `config`.
    pub fn from_config(config: &DedupConfig) -> PipelineResult<Self> {
        Ok(Self::new()
            .with_pair_exclusions(PairExclusions::from_names(&config.pair_exclusions)?)
            .with_report_dir(config.report_dir.clone()))
    }

    /// Append a strategy; strategies run in registration order.
    pub fn with_strategy(mut self, strategy: Arc<dyn SimilarityStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn with_exclusion_filter(mut self, filter: ExclusionFilter) -> Self {
        self.exclusion_filter = filter;
        self
    }

    pub fn with_pair_exclusions(mut self, exclusions: PairExclusions) -> Self {
        self.pair_exclusions = exclusions;
        self
    }

    pub fn with_comparison_sink(mut self, sink: Arc<dyn ComparisonSink>) -> Self {
        self.comparison_sink = Some(sink);
        self
    }

    /// Dump the entity's report here after every processed message.
    pub fn with_report_dir(mut self, directory: impl Into<PathBuf>) -> Self {
        self.report_dir = Some(directory.into());
        self
    }

    pub fn session(&self) -> &DedupSession {
        &self.session
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Parse a raw message body and process it.
    pub async fn handle_message(&self, body: &[u8]) -> PipelineResult<MessageOutcome> {
        let (entity, reference) = InboundMessage::parse(body)?.into_parts();
        self.process(entity, reference).await
    }

    pub async fn process(&self, entity: Entity, mut reference: Reference) -> PipelineResult<MessageOutcome> {
        let identifier = reference.unique_identifier();
        if let Some(rule) = self.exclusion_filter.matching_rule(&reference) {
            info!(reference = %identifier, rule, "reference discarded");
            return Ok(MessageOutcome::Discarded {
                rule: rule.to_string(),
            });
        }

        let shared = self.session.builder_for(&entity)?;
        default_contributor(&entity, &mut reference);
        reference.compute_last_names();

        let mut builder = shared.lock().await;
        builder.add_reference(&reference);

        let raw = self.collect_candidates(&entity, &reference).await;

        let mut trivial_pairs = Vec::new();
        let mut remaining = Vec::new();
        for result in raw {
            builder.add_reference(&result.reference2);
            let target = result.target_key();
            if target != identifier && self.classifier.is_duplicate(&result.reference1, &result.reference2) {
                debug!(source = %identifier, target = %target, "trivial duplicate");
                builder.add_trivial_duplicate(&result.reference1, &result.reference2);
                trivial_pairs.push(ordered_pair(identifier.clone(), target));
            } else {
                remaining.push(result);
            }
        }
        trivial_pairs.sort();
        trivial_pairs.dedup();

        let merged = CandidateAggregator::new(&self.pair_exclusions, builder.get_trivial_duplicates())
            .aggregate(remaining);
        let potential: Vec<SimilarityResult> = merged.into_values().collect();
        for result in &potential {
            builder.add_potential_duplicate(&result.reference1, &result.reference2);
        }

        if let Some(sink) = &self.comparison_sink {
            for result in &potential {
                sink.emit(&entity, result).await?;
            }
        }
        if let Some(directory) = &self.report_dir {
            builder.dump_report(directory)?;
        }

        info!(
            entity = %builder.main_entity_id(),
            reference = %identifier,
            trivial = trivial_pairs.len(),
            potential = potential.len(),
            "reference processed"
        );

        Ok(MessageOutcome::Processed(ProcessedMessage {
            main_entity_id: builder.main_entity_id().to_string(),
            reference,
            trivial_pairs,
            potential,
        }))
    }

    /// Run every strategy in order, isolating failures.
    async fn collect_candidates(&self, entity: &Entity, reference: &Reference) -> Vec<SimilarityResult> {
        let mut raw = Vec::new();
        for strategy in &self.strategies {
            if let Err(err) = strategy.load_reference(entity, reference).await {
                warn!(strategy = strategy.name(), error = %err, "load failed");
            }
            match strategy.get_similar_references(entity, reference).await {
                Ok(candidates) => raw.extend(candidates),
                Err(err) => warn!(strategy = strategy.name(), error = %err, "query failed, skipping strategy"),
            }
        }
        raw
    }
}

/// A reference without contributions is attributed to the entity itself.
fn default_contributor(entity: &Entity, reference: &mut Reference) {
    if !reference.contributions.is_empty() {
        return;
    }
    let Some(first) = entity.identifiers.first() else {
        return;
    };
    reference.contributions.push(Contribution {
        rank: Some(0),
        contributor: Contributor::new(first.id_type.clone(), entity.name.clone())
            .with_source_identifier(first.value.clone()),
        role: "Author".to_string(),
    });
}
