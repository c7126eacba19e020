//! Candidate generation: the strategy contract and its in-process backends

pub mod semantic;
pub mod syntactic;
pub mod traits;

#[cfg(feature = "embeddings")]
pub use semantic::FastEmbedEmbedder;
pub use semantic::{
    Embedder, EmbeddingError, InMemoryVectorStore, SemanticSimilarityStrategy, SemanticText, VectorStore,
};
pub use syntactic::{TitleSyntacticStrategy, TITLE_SYNTACTIC_NAME};
pub use traits::{Candidates, SimilarityStrategy, StrategyError, StrategyResult};
