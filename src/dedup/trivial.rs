//! Deterministic detection of certain ("trivial") duplicates
//!
//! Rules are evaluated as an ordered short-circuit chain; the first rule
//! that matches decides. When none of the identifier-like rules match,
//! the descriptive-metadata rule has the final word.

use super::normalize::normalize;
use crate::model::Reference;
use std::collections::HashSet;

const DOI_PREFIXES: [&str; 2] = ["https://doi.org/", "http://doi.org/"];

/// Which rule of the chain produced a duplicate verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateRule {
    /// A normalized (type, value) identifier pair is shared
    SharedIdentifier,
    /// Same ISBN-13 or ISBN-10
    SharedIsbn,
    /// A manifestation page or URI identifier is shared
    SharedUrl,
    /// Titles, abstracts, document types and contributors agree
    MatchingMetadata,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TrivialDuplicateClassifier;

impl TrivialDuplicateClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn is_duplicate(&self, reference1: &Reference, reference2: &Reference) -> bool {
        self.classify(reference1, reference2).is_some()
    }

    /// Run the rule chain, returning the rule that matched, if any.
    pub fn classify(&self, reference1: &Reference, reference2: &Reference) -> Option<DuplicateRule> {
        if !identifier_keys(reference1).is_disjoint(&identifier_keys(reference2)) {
            return Some(DuplicateRule::SharedIdentifier);
        }
        if same_isbn(reference1, reference2) {
            return Some(DuplicateRule::SharedIsbn);
        }
        if !url_keys(reference1).is_disjoint(&url_keys(reference2)) {
            return Some(DuplicateRule::SharedUrl);
        }
        if matching_metadata(reference1, reference2) {
            return Some(DuplicateRule::MatchingMetadata);
        }
        None
    }
}

fn identifier_keys(reference: &Reference) -> HashSet<(String, String)> {
    reference
        .identifiers
        .iter()
        .map(|identifier| {
            let id_type = identifier.id_type.trim().to_lowercase();
            let value = identifier.value.trim().to_lowercase();
            if id_type == "doi" {
                let bare = strip_doi_prefix(&value).to_string();
                return (id_type, bare);
            }
            (id_type, value)
        })
        .filter(|(_, value)| !value.is_empty())
        .collect()
}

fn strip_doi_prefix(value: &str) -> &str {
    DOI_PREFIXES
        .iter()
        .find_map(|prefix| value.strip_prefix(*prefix))
        .unwrap_or(value)
}

fn same_isbn(reference1: &Reference, reference2: &Reference) -> bool {
    let (Some(book1), Some(book2)) = (&reference1.book, &reference2.book) else {
        return false;
    };
    let same = |a: &Option<String>, b: &Option<String>| match (a, b) {
        (Some(a), Some(b)) => {
            let (a, b) = (a.trim(), b.trim());
            !a.is_empty() && a == b
        }
        _ => false,
    };
    same(&book1.isbn13, &book2.isbn13) || same(&book1.isbn10, &book2.isbn10)
}

fn url_keys(reference: &Reference) -> HashSet<String> {
    let pages = reference
        .manifestations
        .iter()
        .filter_map(|m| m.page.as_deref());
    let uris = reference
        .identifiers
        .iter()
        .filter(|id| id.id_type.eq_ignore_ascii_case("uri"))
        .map(|id| id.value.as_str());

    pages
        .chain(uris)
        .map(|url| {
            let url = url.trim();
            url.strip_suffix("/id").unwrap_or(url).to_lowercase()
        })
        .filter(|url| !url.is_empty())
        .collect()
}

fn normalized_set<'a>(values: impl Iterator<Item = &'a str>) -> HashSet<String> {
    values.map(normalize).collect()
}

fn matching_metadata(reference1: &Reference, reference2: &Reference) -> bool {
    if normalized_set(reference1.title_values()) != normalized_set(reference2.title_values()) {
        return false;
    }

    // Absent abstracts or document types never block a verdict.
    if !reference1.abstracts.is_empty() && !reference2.abstracts.is_empty() {
        let abstracts1 = normalized_set(reference1.abstracts.iter().map(|a| a.value.as_str()));
        let abstracts2 = normalized_set(reference2.abstracts.iter().map(|a| a.value.as_str()));
        if abstracts1 != abstracts2 {
            return false;
        }
    }

    if !reference1.document_type.is_empty() && !reference2.document_type.is_empty() {
        let labels1: HashSet<&str> = reference1.document_type.iter().map(|d| d.label.as_str()).collect();
        let labels2: HashSet<&str> = reference2.document_type.iter().map(|d| d.label.as_str()).collect();
        if labels1.is_disjoint(&labels2) {
            return false;
        }
    }

    normalized_set(reference1.contributor_names()) == normalized_set(reference2.contributor_names())
}
