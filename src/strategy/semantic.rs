//! Embedding-based similarity over per-entity vector stores
//!
//! Each loaded reference is summarised as text, embedded, and cached. A query
//! embeds the incoming reference the same way and returns the nearest cached
//! references above a cosine-similarity threshold.
//!
//! Uses a trait-based embedding backend (`Embedder`) so production code can
//! use fastembed while tests use deterministic mock embedders.

use super::traits::{Candidates, SimilarityStrategy, StrategyError, StrategyResult};
use crate::config::SemanticConfig;
use crate::dedup::{identifiers_from_same_source, share_identifier};
use crate::model::{Entity, Reference, SimilarityResult};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding returned no results")]
    EmptyResult,
    #[error("embedding model error: {0}")]
    ModelError(String),
}

impl From<EmbeddingError> for StrategyError {
    fn from(err: EmbeddingError) -> Self {
        StrategyError::Embedding(err.to_string())
    }
}

/// Trait for embedding text into vectors.
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, returning one vector per text.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Trait for storing and querying embedding vectors.
///
/// All operations are scoped by `scope` (the main entity id) so vectors of
/// different entities never mix.
pub trait VectorStore: Send + Sync {
    fn store(&self, scope: &str, id: &str, vector: Vec<f32>);
    fn has(&self, scope: &str, id: &str) -> bool;
    /// Ids whose vectors are at least `threshold` similar to `query`, most
    /// similar first.
    fn find_similar(&self, scope: &str, query: &[f32], threshold: f32) -> Vec<(String, f32)>;
}

/// In-memory vector store. Thread-safe via RwLock.
#[derive(Default)]
pub struct InMemoryVectorStore {
    /// Outer key: scope, inner key: reference unique identifier
    vectors: RwLock<HashMap<String, HashMap<String, Vec<f32>>>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VectorStore for InMemoryVectorStore {
    fn store(&self, scope: &str, id: &str, vector: Vec<f32>) {
        self.vectors
            .write()
            .unwrap()
            .entry(scope.to_string())
            .or_default()
            .insert(id.to_string(), vector);
    }

    fn has(&self, scope: &str, id: &str) -> bool {
        self.vectors
            .read()
            .unwrap()
            .get(scope)
            .map_or(false, |vectors| vectors.contains_key(id))
    }

    fn find_similar(&self, scope: &str, query: &[f32], threshold: f32) -> Vec<(String, f32)> {
        let store = self.vectors.read().unwrap();
        let Some(vectors) = store.get(scope) else {
            return Vec::new();
        };
        let mut results: Vec<(String, f32)> = vectors
            .iter()
            .map(|(id, cached)| (id.clone(), cosine_similarity(query, cached)))
            .filter(|(_, sim)| *sim >= threshold)
            .collect();
        results.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        results
    }
}

#[cfg(feature = "embeddings")]
mod fastembed_impl {
    use super::{Embedder, EmbeddingError};
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use std::sync::Mutex;

    /// Embedder backed by fastembed (ONNX Runtime).
    ///
    /// `TextEmbedding::embed` needs `&mut self`, hence the `Mutex`.
    pub struct FastEmbedEmbedder {
        model: Mutex<TextEmbedding>,
    }

    impl FastEmbedEmbedder {
        pub fn new(model: EmbeddingModel) -> Result<Self, EmbeddingError> {
            let options = InitOptions::new(model).with_show_download_progress(false);
            let embedding = TextEmbedding::try_new(options)
                .map_err(|e| EmbeddingError::ModelError(e.to_string()))?;
            Ok(Self {
                model: Mutex::new(embedding),
            })
        }

        /// Multilingual model, suited to mixed French/English notices.
        pub fn default_model() -> Result<Self, EmbeddingError> {
            Self::new(EmbeddingModel::ParaphraseMLMiniLML12V2)
        }
    }

    impl Embedder for FastEmbedEmbedder {
        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }
            let mut model = self.model.lock().unwrap();
            let embeddings = model
                .embed(texts.to_vec(), None)
                .map_err(|e| EmbeddingError::ModelError(e.to_string()))?;
            if embeddings.is_empty() {
                return Err(EmbeddingError::EmptyResult);
            }
            Ok(embeddings)
        }
    }
}

#[cfg(feature = "embeddings")]
pub use fastembed_impl::FastEmbedEmbedder;

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// What text a reference is summarised as before embedding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticText {
    /// Document types, titles, subtitles, contributors and abstracts
    Notice,
    /// Titles only
    Title,
}

impl SemanticText {
    pub fn summarise(&self, entity: &Entity, reference: &Reference) -> String {
        let join = |values: Vec<&str>| values.join(" | ");
        let titles = join(reference.title_values().collect());
        match self {
            SemanticText::Title => titles,
            SemanticText::Notice => {
                let document_types: BTreeSet<&str> =
                    reference.document_type.iter().map(|d| d.label.as_str()).collect();
                let subtitles = join(reference.subtitles.iter().map(|s| s.value.as_str()).collect());
                let abstracts = join(reference.abstracts.iter().map(|a| a.value.as_str()).collect());
                let contributors = if reference.contributions.is_empty() {
                    entity.name.clone()
                } else {
                    join(reference.contributor_names().collect())
                };
                [
                    join(document_types.into_iter().collect()),
                    titles,
                    subtitles,
                    contributors,
                    abstracts,
                ]
                .join("\n")
            }
        }
    }
}

pub struct SemanticSimilarityStrategy {
    name: String,
    text: SemanticText,
    threshold: f32,
    top_k: usize,
    embedder: Box<dyn Embedder>,
    vectors: Box<dyn VectorStore>,
    /// Outer key: main entity id, inner key: unique identifier
    references: DashMap<String, HashMap<String, Reference>>,
}

impl SemanticSimilarityStrategy {
    /// Create a strategy with an in-memory vector store.
    pub fn new(text: SemanticText, config: &SemanticConfig, embedder: Box<dyn Embedder>) -> Self {
        Self::with_vector_store(text, config, embedder, Box::new(InMemoryVectorStore::new()))
    }

    pub fn with_vector_store(
        text: SemanticText,
        config: &SemanticConfig,
        embedder: Box<dyn Embedder>,
        vectors: Box<dyn VectorStore>,
    ) -> Self {
        let name = match text {
            SemanticText::Notice => "Notice semantic similarity".to_string(),
            SemanticText::Title => format!("Title semantic similarity (threshold: {})", config.threshold),
        };
        Self {
            name,
            text,
            threshold: config.threshold,
            top_k: config.top_k,
            embedder,
            vectors,
            references: DashMap::new(),
        }
    }

    fn embed_one(&self, text: &str) -> StrategyResult<Vec<f32>> {
        self.embedder
            .embed_batch(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::EmptyResult.into())
    }
}

#[async_trait]
impl SimilarityStrategy for SemanticSimilarityStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load_reference(&self, entity: &Entity, reference: &Reference) -> StrategyResult<()> {
        let scope = entity.main_entity_id()?;
        let identifier = reference.unique_identifier();
        if self.vectors.has(scope, &identifier) {
            return Ok(());
        }
        let text = self.text.summarise(entity, reference);
        if text.trim().is_empty() {
            debug!(reference = %identifier, strategy = %self.name, "nothing to embed");
            return Ok(());
        }
        let vector = self.embed_one(&text)?;
        self.vectors.store(scope, &identifier, vector);
        self.references
            .entry(scope.to_string())
            .or_default()
            .entry(identifier)
            .or_insert_with(|| reference.clone());
        Ok(())
    }

    async fn get_similar_references(
        &self,
        entity: &Entity,
        reference: &Reference,
    ) -> StrategyResult<Candidates> {
        let scope = entity.main_entity_id()?;
        let text = self.text.summarise(entity, reference);
        if text.trim().is_empty() {
            return Ok(Box::new(std::iter::empty()));
        }
        let query = self.embed_one(&text)?;
        let identifier = reference.unique_identifier();

        let mut results = Vec::new();
        for (id, similarity) in self
            .vectors
            .find_similar(scope, &query, self.threshold)
            .into_iter()
            .take(self.top_k)
        {
            if id == identifier || similarity <= self.threshold {
                continue;
            }
            let candidate = self
                .references
                .get(scope)
                .and_then(|loaded| loaded.get(&id).cloned());
            let Some(candidate) = candidate else {
                continue;
            };
            if identifiers_from_same_source(reference, &candidate)
                || share_identifier(reference, &candidate)
            {
                continue;
            }
            results.push(SimilarityResult::new(
                reference.clone(),
                candidate,
                self.name.clone(),
                f64::from(similarity),
            ));
        }
        Ok(Box::new(results.into_iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic embedder: known texts map to fixed vectors, anything
    /// else to the zero vector.
    struct MockEmbedder {
        vectors: HashMap<String, Vec<f32>>,
    }

    impl MockEmbedder {
        fn new(pairs: &[(&str, [f32; 3])]) -> Self {
            Self {
                vectors: pairs
                    .iter()
                    .map(|(text, v)| (text.to_string(), v.to_vec()))
                    .collect(),
            }
        }
    }

    impl Embedder for MockEmbedder {
        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts
                .iter()
                .map(|text| self.vectors.get(*text).cloned().unwrap_or_else(|| vec![0.0; 3]))
                .collect())
        }
    }

    struct FailingEmbedder;

    impl Embedder for FailingEmbedder {
        fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Err(EmbeddingError::ModelError("model not loaded".to_string()))
        }
    }

    fn entity() -> Entity {
        Entity::new("Jeanne Dupont").with_identifier("idref", "123")
    }

    fn title_strategy(embedder: impl Embedder + 'static) -> SemanticSimilarityStrategy {
        SemanticSimilarityStrategy::new(SemanticText::Title, &SemanticConfig::default(), Box::new(embedder))
    }

    #[test]
    fn cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn in_memory_store_is_scoped_and_sorted() {
        let store = InMemoryVectorStore::new();
        store.store("a", "x", vec![1.0, 0.0]);
        store.store("a", "y", vec![0.8, 0.6]);
        store.store("b", "z", vec![1.0, 0.0]);

        let found = store.find_similar("a", &[1.0, 0.0], 0.5);
        let ids: Vec<&str> = found.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["x", "y"]);
        assert!(store.has("b", "z"));
        assert!(!store.has("a", "z"));
    }

    #[test]
    fn notice_summary_falls_back_to_entity_name() {
        let reference = Reference::new("hal", "1")
            .with_title("Deep learning")
            .with_document_type("Article")
            .with_document_type("Article")
            .with_abstract("About networks.");
        let summary = SemanticText::Notice.summarise(&entity(), &reference);
        assert_eq!(summary, "Article\nDeep learning\n\nJeanne Dupont\nAbout networks.");

        let with_author = reference.with_contributor("Paul Martin");
        assert!(SemanticText::Notice.summarise(&entity(), &with_author).contains("Paul Martin"));
    }

    #[tokio::test]
    async fn close_vectors_above_threshold_are_returned() {
        let strategy = title_strategy(MockEmbedder::new(&[
            ("Deep learning", [1.0, 0.0, 0.0]),
            ("Deep-learning", [0.99, 0.05, 0.0]),
            ("Cooking", [0.0, 1.0, 0.0]),
        ]));
        let stored = Reference::new("hal", "hal-1").with_title("Deep-learning");
        let unrelated = Reference::new("hal", "hal-2").with_title("Cooking");
        strategy.load_reference(&entity(), &stored).await.unwrap();
        strategy.load_reference(&entity(), &unrelated).await.unwrap();

        let query = Reference::new("scanR", "doi-1").with_title("Deep learning");
        let results: Vec<_> = strategy
            .get_similar_references(&entity(), &query)
            .await
            .unwrap()
            .collect();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].reference2, stored);
        assert_eq!(
            results[0].similarity_strategies(),
            ["Title semantic similarity (threshold: 0.95)"]
        );
        assert!(results[0].scores()[0] > 0.95);
    }

    #[tokio::test]
    async fn self_and_shared_identifier_candidates_are_filtered() {
        let strategy = title_strategy(MockEmbedder::new(&[("Deep learning", [1.0, 0.0, 0.0])]));
        let query = Reference::new("scanR", "doi-1")
            .with_title("Deep learning")
            .with_identifier("doi", "10.1/x");
        let twin = Reference::new("hal", "hal-1")
            .with_title("Deep learning")
            .with_identifier("doi", "10.1/x");
        strategy.load_reference(&entity(), &query).await.unwrap();
        strategy.load_reference(&entity(), &twin).await.unwrap();

        let results: Vec<_> = strategy
            .get_similar_references(&entity(), &query)
            .await
            .unwrap()
            .collect();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn embedding_failures_surface_as_strategy_errors() {
        let strategy = title_strategy(FailingEmbedder);
        let reference = Reference::new("hal", "1").with_title("Deep learning");
        let err = strategy.load_reference(&entity(), &reference).await.unwrap_err();
        assert!(matches!(err, StrategyError::Embedding(_)));
    }

    #[tokio::test]
    async fn loaded_references_are_kept_per_entity() {
        let strategy = title_strategy(MockEmbedder::new(&[("Deep learning", [1.0, 0.0, 0.0])]));
        let alice = Entity::new("Alice Martin").with_identifier("idref", "A");
        let bob = Entity::new("Bob Durand").with_identifier("idref", "B");
        let shared = Reference::new("hal", "hal-1").with_title("Deep learning");

        strategy
            .load_reference(&alice, &shared.clone().with_contributor("Alice Martin"))
            .await
            .unwrap();
        strategy
            .load_reference(&bob, &shared.clone().with_contributor("Bob Durand"))
            .await
            .unwrap();

        let query = Reference::new("scanR", "doi-2").with_title("Deep learning");
        let results: Vec<_> = strategy
            .get_similar_references(&bob, &query)
            .await
            .unwrap()
            .collect();
        assert_eq!(results.len(), 1);
        let names: Vec<&str> = results[0].reference2.contributor_names().collect();
        assert_eq!(names, ["Bob Durand"]);
    }

    #[tokio::test]
    async fn references_without_text_are_not_indexed() {
        let strategy = title_strategy(MockEmbedder::new(&[]));
        let untitled = Reference::new("hal", "1");
        strategy.load_reference(&entity(), &untitled).await.unwrap();
        let results: Vec<_> = strategy
            .get_similar_references(&entity(), &untitled)
            .await
            .unwrap()
            .collect();
        assert!(results.is_empty());
    }
}
