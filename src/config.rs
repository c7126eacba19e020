//! Runtime configuration, loaded from an optional YAML file
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Where `<main_entity_id>.txt` reports are dumped
    pub report_dir: PathBuf,
    /// Where rotating `comparisons-NNNN.jsonl` files are written
    pub comparison_dir: PathBuf,
    pub records_per_file: usize,
    /// Names of the pair exclusion rules to enable
    pub pair_exclusions: Vec<String>,
    pub syntactic: SyntacticConfig,
    pub semantic: SemanticConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntacticConfig {
    pub max_edit_distance: usize,
    /// Analyzed titles shorter than this also require a shared author
    pub min_meaningful_title_length: usize,
    pub common_titles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticConfig {
    /// Cosine similarity must be strictly above this
    pub threshold: f32,
    pub top_k: usize,
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"))
        .join("refdedup")
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            report_dir: data_dir().join("reports"),
            comparison_dir: data_dir().join("comparisons"),
            records_per_file: 100,
            pair_exclusions: vec![crate::dedup::MISSING_IDREF_NNT.to_string()],
            syntactic: SyntacticConfig::default(),
            semantic: SemanticConfig::default(),
        }
    }
}

impl Default for SyntacticConfig {
    fn default() -> Self {
        Self {
            max_edit_distance: 2,
            min_meaningful_title_length: 12,
            common_titles: ["Préface", "Introduction", "Preface"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            threshold: 0.95,
            top_k: 20,
        }
    }
}

impl DedupConfig {
    pub fn from_yaml(text: &str) -> ConfigResult<Self> {
        // serde_yaml rejects an empty document for a struct
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Load `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
