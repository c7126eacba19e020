//! Common test utilities for pipeline scenarios
//!
//! Fixtures for authors and references, plus a scripted strategy that
//! returns preset candidates so scenarios do not depend on fuzzy matching.

#![allow(dead_code)]

use async_trait::async_trait;
use refdedup::model::{Entity, Reference, SimilarityResult};
use refdedup::strategy::{
    Candidates, Embedder, EmbeddingError, SimilarityStrategy, StrategyError, StrategyResult,
};
use std::collections::HashMap;
use std::sync::Mutex;

pub fn author() -> Entity {
    Entity::new("Jeanne Dupont")
        .with_identifier("orcid", "0000-0001")
        .with_identifier("idref", "123")
}

pub fn article(harvester: &str, source_id: &str, title: &str) -> Reference {
    Reference::new(harvester, source_id).with_title(title)
}

/// Strategy returning, for each queried reference, a fixed list of
/// (candidate, score). Loaded references are recorded for inspection.
pub struct ScriptedStrategy {
    name: String,
    script: HashMap<String, Vec<(Reference, f64)>>,
    loaded: Mutex<Vec<String>>,
}

impl ScriptedStrategy {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            script: HashMap::new(),
            loaded: Mutex::new(Vec::new()),
        }
    }

    /// When `query` is processed, answer `candidate` with `score`.
    pub fn answer(mut self, query: &Reference, candidate: &Reference, score: f64) -> Self {
        self.script
            .entry(query.unique_identifier())
            .or_default()
            .push((candidate.clone(), score));
        self
    }

    pub fn loaded(&self) -> Vec<String> {
        self.loaded.lock().unwrap().clone()
    }
}

#[async_trait]
impl SimilarityStrategy for ScriptedStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load_reference(&self, _entity: &Entity, reference: &Reference) -> StrategyResult<()> {
        self.loaded.lock().unwrap().push(reference.unique_identifier());
        Ok(())
    }

    async fn get_similar_references(
        &self,
        _entity: &Entity,
        reference: &Reference,
    ) -> StrategyResult<Candidates> {
        let results: Vec<SimilarityResult> = self
            .script
            .get(&reference.unique_identifier())
            .into_iter()
            .flatten()
            .map(|(candidate, score)| {
                SimilarityResult::new(reference.clone(), candidate.clone(), self.name.clone(), *score)
            })
            .collect();
        Ok(Box::new(results.into_iter()))
    }
}

/// Strategy whose backend is always down.
pub struct FailingStrategy;

#[async_trait]
impl SimilarityStrategy for FailingStrategy {
    fn name(&self) -> &str {
        "Failing backend"
    }

    async fn load_reference(&self, _entity: &Entity, _reference: &Reference) -> StrategyResult<()> {
        Err(StrategyError::Unavailable("index offline".to_string()))
    }

    async fn get_similar_references(
        &self,
        _entity: &Entity,
        _reference: &Reference,
    ) -> StrategyResult<Candidates> {
        Err(StrategyError::Backend("connection refused".to_string()))
    }
}

/// Embedder mapping every text to the same vector, so every loaded
/// reference is a perfect semantic match.
pub struct ConstantEmbedder;

impl Embedder for ConstantEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
    }
}
