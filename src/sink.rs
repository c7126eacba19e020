//! Persistence of comparison records and report files
//!
//! Comparison records go to newline-delimited JSON files that rotate after a
//! fixed number of records. Reports are written whole, through a temporary
//! file renamed into place, so a reader never sees a partial report.

use crate::model::{Entity, Reference, SimilarityResult};
use crate::report::comparison_table;
use async_trait::async_trait;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SinkResult<T> = Result<T, SinkError>;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SinkError + '_ {
    move |source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// One machine-readable record per merged candidate
#[derive(Debug, Serialize)]
pub struct ComparisonRecord<'a> {
    /// HTML side-by-side table
    pub text: String,
    pub entity: &'a Entity,
    pub reference_1: &'a Reference,
    pub reference_2: &'a Reference,
    pub similarity_strategies: &'a [String],
    pub scores: &'a [f64],
}

impl<'a> ComparisonRecord<'a> {
    pub fn new(entity: &'a Entity, result: &'a SimilarityResult) -> Self {
        Self {
            text: comparison_table(result),
            entity,
            reference_1: &result.reference1,
            reference_2: &result.reference2,
            similarity_strategies: result.similarity_strategies(),
            scores: result.scores(),
        }
    }
}

/// Where comparison records are emitted.
#[async_trait]
pub trait ComparisonSink: Send + Sync {
    async fn emit(&self, entity: &Entity, result: &SimilarityResult) -> SinkResult<()>;
}

/// Write `contents` to `path` via a sibling temporary file and a rename.
pub fn write_atomically(path: &Path, contents: &str) -> SinkResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents).map_err(io_error(&tmp))?;
    fs::rename(&tmp, path).map_err(io_error(path))?;
    Ok(())
}

struct RotationState {
    file_number: usize,
    records_in_file: usize,
    writer: Option<BufWriter<File>>,
}

/// Appends records to `comparisons-NNNN.jsonl`, starting a new file every
/// `records_per_file` records. Numbering continues after the highest file
/// already present in the directory.
pub struct JsonlComparisonSink {
    directory: PathBuf,
    records_per_file: usize,
    state: Mutex<RotationState>,
}

impl JsonlComparisonSink {
    pub fn new(directory: impl Into<PathBuf>, records_per_file: usize) -> SinkResult<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory).map_err(io_error(&directory))?;
        let last = Self::highest_file_number(&directory)?;
        Ok(Self {
            directory,
            records_per_file: records_per_file.max(1),
            state: Mutex::new(RotationState {
                file_number: last,
                records_in_file: 0,
                writer: None,
            }),
        })
    }

    pub fn file_path(&self, file_number: usize) -> PathBuf {
        self.directory.join(format!("comparisons-{:04}.jsonl", file_number))
    }

    fn highest_file_number(directory: &Path) -> SinkResult<usize> {
        let entries = fs::read_dir(directory).map_err(io_error(directory))?;
        let highest = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                name.strip_prefix("comparisons-")?
                    .strip_suffix(".jsonl")?
                    .parse::<usize>()
                    .ok()
            })
            .max()
            .unwrap_or(0);
        Ok(highest)
    }

    /// Serialize and append one line, rotating first when the current file
    /// is full.
    pub fn write_line(&self, line: &str) -> SinkResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.writer.is_none() || state.records_in_file >= self.records_per_file {
            // State only advances once the next file is open.
            let next = state.file_number + 1;
            let path = self.file_path(next);
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(io_error(&path))?;
            info!(path = %path.display(), "comparison file opened");
            state.file_number = next;
            state.records_in_file = 0;
            state.writer = Some(BufWriter::new(file));
        }

        let path = self.file_path(state.file_number);
        if let Some(writer) = state.writer.as_mut() {
            writeln!(writer, "{}", line).map_err(io_error(&path))?;
            writer.flush().map_err(io_error(&path))?;
        }
        state.records_in_file += 1;
        Ok(())
    }
}

#[async_trait]
impl ComparisonSink for JsonlComparisonSink {
    async fn emit(&self, entity: &Entity, result: &SimilarityResult) -> SinkResult<()> {
        let line = serde_json::to_string(&ComparisonRecord::new(entity, result))?;
        self.write_line(&line)?;
        debug!(target_ref = %result.target_key(), "comparison record written");
        Ok(())
    }
}
