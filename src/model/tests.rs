//! Deserialization tests with harvester-shaped fixtures

use super::*;
use serde_json::{json, Value};

/// A ScanR publication as it arrives inside a reference event
fn scanr_reference_fixture() -> Value {
    json!({
        "source_identifier": "doi10.1000/xyz",
        "harvester": "scanR",
        "identifiers": [
            {"type": "doi", "value": "10.1000/xyz"},
            {"type": "uri", "value": "https://hal.science/hal-01234567"}
        ],
        "manifestations": [{"page": "https://example.org/pub/1"}],
        "titles": [{"value": "Réseaux de neurones", "language": "fr"}],
        "subtitles": [],
        "abstracts": [{"value": "Une étude.", "language": null}],
        "subjects": [{
            "uri": null,
            "pref_labels": [{"value": "Informatique", "language": "fr"}],
            "alt_labels": []
        }],
        "document_type": [{"uri": "http://purl.org/ontology/bibo/Article", "label": "Journal article"}],
        "contributions": [{
            "rank": 0,
            "role": "Author",
            "contributor": {
                "source": "scanR",
                "source_identifier": "idref123",
                "name": "Jeanne Dupont",
                "name_variants": []
            }
        }],
        "issued": "2019-05-01T00:00:00",
        "issue": {
            "volume": "12",
            "number": ["3"],
            "journal": {"issn": ["1234-5678"], "titles": ["Revue d'IA"]}
        },
        "book": null
    })
}

fn entity_fixture() -> Value {
    json!({
        "identifiers": [
            {"type": "orcid", "value": "0000-0002-1825-0097"},
            {"type": "idref", "value": "026857304"}
        ],
        "name": "Jeanne Dupont"
    })
}

#[test]
fn reference_deserializes_from_harvester_json() {
    let reference: Reference = serde_json::from_value(scanr_reference_fixture()).unwrap();

    assert_eq!(reference.unique_identifier(), "scanR-doi10.1000/xyz");
    assert_eq!(reference.identifiers.len(), 2);
    assert_eq!(reference.identifiers[0].id_type, "doi");
    assert_eq!(reference.titles[0].language.as_deref(), Some("fr"));
    assert_eq!(reference.contributions[0].contributor.name, "Jeanne Dupont");
    assert_eq!(
        reference.issue.as_ref().and_then(|i| i.volume.as_deref()),
        Some("12")
    );
    assert!(reference.issued.is_some());
    assert!(reference.book.is_none());
    assert!(reference.similarity_strategies.is_empty());
}

#[test]
fn missing_optional_lists_default_to_empty() {
    let reference: Reference = serde_json::from_value(json!({
        "source_identifier": "42",
        "harvester": "hal",
        "manifestations": null
    }))
    .unwrap();

    assert!(reference.titles.is_empty());
    assert!(reference.abstracts.is_empty());
    assert!(reference.document_type.is_empty());
    assert!(reference.manifestations.is_empty());
    assert!(reference.issued.is_none());
}

#[test]
fn reference_round_trips_through_json() {
    let reference: Reference = serde_json::from_value(scanr_reference_fixture()).unwrap();
    let serialized = serde_json::to_value(&reference).unwrap();
    let back: Reference = serde_json::from_value(serialized).unwrap();
    assert_eq!(back, reference);
}

#[test]
fn entity_deserializes_and_resolves_main_id() {
    let entity: Entity = serde_json::from_value(entity_fixture()).unwrap();
    assert_eq!(entity.name, "Jeanne Dupont");
    assert_eq!(entity.main_entity_id().unwrap(), "026857304");
}

#[test]
fn similarity_result_serializes_aligned_lists() {
    let r1 = Reference::new("hal", "1");
    let r2 = Reference::new("scanR", "2");
    let result = SimilarityResult::new(r1, r2, "Title syntactic similarity", 0.9);
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["similarity_strategies"], json!(["Title syntactic similarity"]));
    assert_eq!(value["scores"], json!([0.9]));
    assert_eq!(value["reference2"]["harvester"], "scanR");
}
