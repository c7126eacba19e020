//! Pluggable rules that reject known false-positive candidate pairs
//!
//! These encode source-specific data-quality workarounds. They are kept
//! outside the duplicate classifier and enabled by name from configuration,
//! because their correctness depends on upstream harvester behaviour.

use super::normalize::normalize;
use crate::model::Reference;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PairRuleError {
    #[error("unknown pair exclusion rule: {0}")]
    Unknown(String),
}

/// A named predicate over a candidate pair.
pub trait PairExclusionRule: Send + Sync {
    fn name(&self) -> &str;

    /// True when the pair must not be reported as a potential duplicate.
    fn excludes(&self, reference1: &Reference, reference2: &Reference) -> bool;
}

/// ScanR keys theses by their national thesis number (NNT). An Idref thesis
/// record that lacks the `nnt` identifier can never be reconciled with such a
/// ScanR record, so similarity strategies pairing them are noise.
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingIdrefNnt;

pub const MISSING_IDREF_NNT: &str = "missing-idref-nnt";

impl MissingIdrefNnt {
    fn is_thesis(reference: &Reference) -> bool {
        reference.document_type.iter().any(|doc_type| {
            let label = normalize(&doc_type.label);
            label.contains("thesis") || label.contains("these")
        })
    }

    fn is_idref_thesis_without_nnt(reference: &Reference) -> bool {
        reference.harvester.eq_ignore_ascii_case("idref")
            && Self::is_thesis(reference)
            && !reference
                .identifiers
                .iter()
                .any(|id| id.id_type.eq_ignore_ascii_case("nnt"))
    }

    fn is_scanr_nnt_thesis(reference: &Reference) -> bool {
        reference.harvester.eq_ignore_ascii_case("scanr")
            && Self::is_thesis(reference)
            && reference.source_identifier.to_lowercase().starts_with("nnt")
    }
}

impl PairExclusionRule for MissingIdrefNnt {
    fn name(&self) -> &str {
        MISSING_IDREF_NNT
    }

    fn excludes(&self, reference1: &Reference, reference2: &Reference) -> bool {
        (Self::is_idref_thesis_without_nnt(reference1) && Self::is_scanr_nnt_thesis(reference2))
            || (Self::is_idref_thesis_without_nnt(reference2) && Self::is_scanr_nnt_thesis(reference1))
    }
}

/// The configured pair exclusion rules, OR'd together.
#[derive(Default)]
pub struct PairExclusions {
    rules: Vec<Box<dyn PairExclusionRule>>,
}

impl PairExclusions {
    pub fn none() -> Self {
        Self::default()
    }

    /// Build the rule set from configured names.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, PairRuleError> {
        let mut exclusions = Self::none();
        for name in names {
            match name.as_ref() {
                MISSING_IDREF_NNT => exclusions.rules.push(Box::new(MissingIdrefNnt)),
                other => return Err(PairRuleError::Unknown(other.to_string())),
            }
        }
        Ok(exclusions)
    }

    pub fn with_rule(mut self, rule: impl PairExclusionRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Name of the first rule excluding the pair, if any
    pub fn matching_rule(&self, reference1: &Reference, reference2: &Reference) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.excludes(reference1, reference2))
            .map(|rule| rule.name())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
