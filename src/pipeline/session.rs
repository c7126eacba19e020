//! DedupSession: per-entity report state owned by the pipeline

use crate::model::{Entity, EntityError};
use crate::report::AuthorReportBuilder;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Shared handle to one entity's report state.
///
/// Holding the lock serializes processing for that entity; different
/// entities proceed independently.
pub type SharedBuilder = Arc<Mutex<AuthorReportBuilder>>;

/// Report builders keyed by main entity id, alive for the session's lifetime.
#[derive(Default)]
pub struct DedupSession {
    builders: DashMap<String, SharedBuilder>,
}

impl DedupSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// The entity's builder, created on first sight.
    pub fn builder_for(&self, entity: &Entity) -> Result<SharedBuilder, EntityError> {
        let main_id = entity.main_entity_id()?;
        if let Some(existing) = self.builders.get(main_id) {
            return Ok(existing.clone());
        }
        let builder = AuthorReportBuilder::new(entity.clone())?;
        let shared = self
            .builders
            .entry(main_id.to_string())
            .or_insert_with(|| {
                debug!(entity = %main_id, "new author session");
                Arc::new(Mutex::new(builder))
            })
            .clone();
        Ok(shared)
    }

    pub fn get(&self, main_entity_id: &str) -> Option<SharedBuilder> {
        self.builders.get(main_entity_id).map(|b| b.clone())
    }

    pub fn main_entity_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.builders.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}
