//! Inbound message envelope

use super::PipelineResult;
use crate::model::{Entity, Reference};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceEvent {
    pub reference: Reference,
}

/// `{"reference_event": {"reference": ...}, "entity": ...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub reference_event: ReferenceEvent,
    pub entity: Entity,
}

impl InboundMessage {
    pub fn new(entity: Entity, reference: Reference) -> Self {
        Self {
            reference_event: ReferenceEvent { reference },
            entity,
        }
    }

    pub fn parse(bytes: &[u8]) -> PipelineResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn into_parts(self) -> (Entity, Reference) {
        (self.entity, self.reference_event.reference)
    }
}
