//! Fuzzy title matching over an in-memory, per-entity index
//!
//! Titles are analyzed into a single compact keyword (lowercase, diacritics
//! dropped, everything but letters and digits removed) and compared with
//! optimal string alignment distance. Short or single-word titles match too
//! easily on their own, so they additionally require a shared author last
//! name.

use super::traits::{Candidates, SimilarityStrategy, StrategyResult};
use crate::config::SyntacticConfig;
use crate::dedup::{all_common_titles, fold_compact, identifiers_from_same_source, normalize};
use crate::model::{Entity, Reference, SimilarityResult};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use strsim::osa_distance;
use tracing::debug;

pub const TITLE_SYNTACTIC_NAME: &str = "Title syntactic similarity";

struct IndexedReference {
    reference: Reference,
    analyzed_titles: Vec<String>,
    last_names: HashSet<String>,
}

impl IndexedReference {
    fn new(reference: &Reference) -> Self {
        Self {
            reference: reference.clone(),
            analyzed_titles: analyzed_titles(reference),
            last_names: normalized_last_names(reference),
        }
    }
}

fn analyzed_titles(reference: &Reference) -> Vec<String> {
    reference
        .title_values()
        .map(fold_compact)
        .filter(|t| !t.is_empty())
        .collect()
}

fn normalized_last_names(reference: &Reference) -> HashSet<String> {
    reference
        .last_names()
        .iter()
        .map(|name| normalize(name))
        .filter(|name| !name.is_empty())
        .collect()
}

pub struct TitleSyntacticStrategy {
    max_edit_distance: usize,
    min_meaningful_title_length: usize,
    common_titles: Vec<String>,
    /// Outer key: main entity id, inner key: unique identifier
    index: DashMap<String, HashMap<String, IndexedReference>>,
}

impl TitleSyntacticStrategy {
    pub fn new(config: &SyntacticConfig) -> Self {
        Self {
            max_edit_distance: config.max_edit_distance,
            min_meaningful_title_length: config.min_meaningful_title_length,
            common_titles: config.common_titles.clone(),
            index: DashMap::new(),
        }
    }

    /// A single word, or too short once analyzed
    fn is_meaningless(&self, title: &str, analyzed: &str) -> bool {
        title.split_whitespace().count() <= 1
            || analyzed.chars().count() < self.min_meaningful_title_length
    }

    /// Best score over every title pair within the edit distance, if any.
    fn best_score(
        &self,
        query: &[(String, bool)],
        query_last_names: &HashSet<String>,
        candidate: &IndexedReference,
    ) -> Option<f64> {
        let shares_author = !query_last_names.is_disjoint(&candidate.last_names);
        let mut best: Option<f64> = None;
        for (analyzed, meaningless) in query {
            if *meaningless && !shares_author {
                continue;
            }
            for other in &candidate.analyzed_titles {
                let distance = osa_distance(analyzed, other);
                if distance > self.max_edit_distance {
                    continue;
                }
                let longest = analyzed.chars().count().max(other.chars().count());
                let score = 1.0 - distance as f64 / longest as f64;
                if best.map_or(true, |b| score > b) {
                    best = Some(score);
                }
            }
        }
        best
    }
}

impl Default for TitleSyntacticStrategy {
    fn default() -> Self {
        Self::new(&SyntacticConfig::default())
    }
}

#[async_trait]
impl SimilarityStrategy for TitleSyntacticStrategy {
    fn name(&self) -> &str {
        TITLE_SYNTACTIC_NAME
    }

    async fn load_reference(&self, entity: &Entity, reference: &Reference) -> StrategyResult<()> {
        let entity_id = entity.main_entity_id()?.to_string();
        self.index
            .entry(entity_id)
            .or_default()
            .insert(reference.unique_identifier(), IndexedReference::new(reference));
        Ok(())
    }

    async fn get_similar_references(
        &self,
        entity: &Entity,
        reference: &Reference,
    ) -> StrategyResult<Candidates> {
        let entity_id = entity.main_entity_id()?;
        let identifier = reference.unique_identifier();
        let query: Vec<(String, bool)> = reference
            .title_values()
            .map(|title| {
                let analyzed = fold_compact(title);
                let meaningless = self.is_meaningless(title, &analyzed);
                (analyzed, meaningless)
            })
            .filter(|(analyzed, _)| !analyzed.is_empty())
            .collect();
        let query_last_names = normalized_last_names(reference);

        let mut scored: Vec<(f64, Reference)> = Vec::new();
        if let Some(entries) = self.index.get(entity_id) {
            for (key, candidate) in entries.iter() {
                if *key == identifier
                    || identifiers_from_same_source(reference, &candidate.reference)
                {
                    continue;
                }
                let Some(score) = self.best_score(&query, &query_last_names, candidate) else {
                    continue;
                };
                let titles = reference.title_values().chain(candidate.reference.title_values());
                if all_common_titles(titles, &self.common_titles) {
                    debug!(target_ref = %key, "common titles only, skipped");
                    continue;
                }
                scored.push((score, candidate.reference.clone()));
            }
        }

        scored.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then_with(|| a.1.unique_identifier().cmp(&b.1.unique_identifier()))
        });
        let source = reference.clone();
        let results: Vec<SimilarityResult> = scored
            .into_iter()
            .map(|(score, target)| SimilarityResult::new(source.clone(), target, TITLE_SYNTACTIC_NAME, score))
            .collect();
        Ok(Box::new(results.into_iter()))
    }
}
