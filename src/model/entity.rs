//! Entity: the author whose references are being deduplicated

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier types that can name an entity, highest priority first.
pub const MAIN_IDENTIFIER_PRIORITY: [&str; 5] =
    ["idref", "orcid", "id_hal_s", "id_hal_i", "scopus_eid"];

#[derive(Debug, Error)]
pub enum EntityError {
    #[error("entity '{0}' carries none of the known identifier types (idref, orcid, id_hal_s, id_hal_i, scopus_eid)")]
    NoKnownIdentifier(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityIdentifier {
    #[serde(rename = "type")]
    pub id_type: String,
    pub value: String,
}

impl EntityIdentifier {
    pub fn new(id_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id_type: id_type.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default)]
    pub identifiers: Vec<EntityIdentifier>,
    pub name: String,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            identifiers: Vec::new(),
            name: name.into(),
        }
    }

    pub fn with_identifier(mut self, id_type: impl Into<String>, value: impl Into<String>) -> Self {
        self.identifiers.push(EntityIdentifier::new(id_type, value));
        self
    }

    /// Resolve the identifier that names this entity's report.
    ///
    /// Scans [`MAIN_IDENTIFIER_PRIORITY`] in order; the first type present wins.
    pub fn main_entity_id(&self) -> Result<&str, EntityError> {
        MAIN_IDENTIFIER_PRIORITY
            .iter()
            .find_map(|wanted| {
                self.identifiers
                    .iter()
                    .find(|id| id.id_type == *wanted)
                    .map(|id| id.value.as_str())
            })
            .ok_or_else(|| EntityError::NoKnownIdentifier(self.name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_id_follows_priority_not_declaration_order() {
        let entity = Entity::new("Ada Lovelace")
            .with_identifier("scopus_eid", "s-1")
            .with_identifier("orcid", "0000-0001")
            .with_identifier("id_hal_s", "ada-lovelace");
        assert_eq!(entity.main_entity_id().unwrap(), "0000-0001");
    }

    #[test]
    fn idref_beats_everything() {
        let entity = Entity::new("Ada")
            .with_identifier("orcid", "0000-0001")
            .with_identifier("idref", "123456789");
        assert_eq!(entity.main_entity_id().unwrap(), "123456789");
    }

    #[test]
    fn unknown_identifier_types_are_fatal() {
        let entity = Entity::new("Nobody").with_identifier("viaf", "42");
        assert!(matches!(
            entity.main_entity_id(),
            Err(EntityError::NoKnownIdentifier(name)) if name == "Nobody"
        ));
    }
}
