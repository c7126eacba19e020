//! Gate for references that must never enter the pipeline
//!
//! Each rule is an independent predicate; the filter discards a reference
//! as soon as any rule does.

use crate::model::Reference;

/// A named predicate over a single incoming reference.
pub trait ExclusionRule: Send + Sync {
    fn name(&self) -> &str;

    fn discard(&self, reference: &Reference) -> bool;
}

/// Books and chapters that ScanR re-publishes from HAL or the SUDOC/Idref
/// catalogues. The originals are harvested directly, so the ScanR copies
/// only add noise.
#[derive(Debug, Clone)]
pub struct ScanrRepublishedBook {
    harvester: String,
    document_markers: Vec<String>,
    excluded_identifier_types: Vec<String>,
    excluded_uri_segments: Vec<String>,
    excluded_source_prefixes: Vec<String>,
}

impl Default for ScanrRepublishedBook {
    fn default() -> Self {
        Self {
            harvester: "scanr".to_string(),
            document_markers: vec!["book".to_string(), "chapter".to_string()],
            excluded_identifier_types: vec!["hal".to_string()],
            excluded_uri_segments: vec!["sudoc".to_string(), "idref".to_string()],
            excluded_source_prefixes: vec!["sudoc".to_string()],
        }
    }
}

impl ScanrRepublishedBook {
    fn is_book(&self, reference: &Reference) -> bool {
        reference.document_type.iter().any(|doc_type| {
            let label = doc_type.label.to_lowercase();
            self.document_markers.iter().any(|marker| label.contains(marker.as_str()))
        })
    }

    fn has_excluded_origin(&self, reference: &Reference) -> bool {
        let by_type = reference
            .identifiers
            .iter()
            .any(|id| self.excluded_identifier_types.contains(&id.id_type));
        let by_uri = reference.identifiers.iter().any(|id| {
            id.id_type == "uri"
                && self
                    .excluded_uri_segments
                    .iter()
                    .any(|segment| id.value.contains(segment.as_str()))
        });
        let by_source = self
            .excluded_source_prefixes
            .iter()
            .any(|prefix| reference.source_identifier.starts_with(prefix.as_str()));
        by_type || by_uri || by_source
    }
}

impl ExclusionRule for ScanrRepublishedBook {
    fn name(&self) -> &str {
        "scanr-republished-book"
    }

    fn discard(&self, reference: &Reference) -> bool {
        reference.harvester.to_lowercase() == self.harvester
            && self.is_book(reference)
            && self.has_excluded_origin(reference)
    }
}

/// The set of exclusion rules evaluated once per incoming reference.
pub struct ExclusionFilter {
    rules: Vec<Box<dyn ExclusionRule>>,
}

impl ExclusionFilter {
    /// A filter with no rules: nothing is discarded.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_rule(mut self, rule: impl ExclusionRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Name of the first rule that discards the reference, if any
    pub fn matching_rule(&self, reference: &Reference) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.discard(reference))
            .map(|rule| rule.name())
    }

    pub fn discard(&self, reference: &Reference) -> bool {
        self.matching_rule(reference).is_some()
    }
}

impl Default for ExclusionFilter {
    fn default() -> Self {
        Self::empty().with_rule(ScanrRepublishedBook::default())
    }
}
