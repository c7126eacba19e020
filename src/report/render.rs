//! Plain-text rendering of report sections

use crate::model::{Entity, Reference};

const MAX_FIELD_LENGTH: usize = 150;
const RULE_WIDTH: usize = 50;
const BLOCK_RULE: &str =
    "────────────────────────────────────────────────────────────────────────────────────────────────────";
const GROUP_RULE: &str = "─────────────────────────────────────────────────────────────────────────────";

pub(crate) const CHAIN_SEPARATOR: &str = " <---> ";

/// Cut `text` to `max` characters, ending with "..." when cut.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

pub(crate) fn entity_header(entity: &Entity) -> Vec<String> {
    let identifiers = entity
        .identifiers
        .iter()
        .map(|id| format!("{}: {}", id.id_type, id.value))
        .collect::<Vec<_>>()
        .join(", ");
    vec![
        format!("Author: {}", entity.name),
        format!("Identifiers: {}\n", identifiers),
    ]
}

pub(crate) fn subtitle(lines: &mut Vec<String>, text: &str) {
    lines.push("=".repeat(RULE_WIDTH));
    lines.push(text.to_string());
    lines.push("=".repeat(RULE_WIDTH));
}

pub(crate) fn closing_rule() -> String {
    "=".repeat(RULE_WIDTH)
}

pub(crate) fn group_header(group_number: usize) -> String {
    format!("{rule}\nGroup n°{n}\n{rule}\n", rule = GROUP_RULE, n = group_number)
}

/// Starred box used for pairs and chains
pub(crate) fn boxed(lines: &mut Vec<String>, first: String, second: String) {
    let border = format!("\t{}", "*".repeat(RULE_WIDTH));
    lines.push(border.clone());
    lines.push(format!("\t{}", first));
    lines.push(format!("\t{}", second));
    lines.push(border);
}

/// The summary block printed for each reference
pub fn reference_block(reference: &Reference, visual_id: &str) -> String {
    let title = reference
        .title_values()
        .next()
        .unwrap_or("No title available")
        .to_string();
    let authors = reference.contributor_names().collect::<Vec<_>>().join(", ");
    let document_types = reference
        .document_type
        .iter()
        .map(|d| d.label.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let publication_date = reference
        .issued
        .map(|d| d.format("%d-%m-%Y").to_string())
        .unwrap_or_else(|| "No date available".to_string());
    let journal_title = reference
        .issue
        .as_ref()
        .and_then(|issue| issue.journal.titles.first().cloned())
        .unwrap_or_else(|| "No journal/book title available".to_string());
    let volume = reference
        .issue
        .as_ref()
        .and_then(|issue| issue.volume.clone())
        .unwrap_or_else(|| "No issue available".to_string());
    let subjects = reference
        .subjects
        .iter()
        .filter_map(|s| s.pref_labels.first().map(|l| l.value.as_str()))
        .collect::<Vec<_>>()
        .join(", ");

    let fields = [
        ("Source Identifier", reference.unique_identifier()),
        ("Title", title),
        ("Authors", authors),
        ("Document Type", document_types),
        ("Publication Date", publication_date),
        ("Journal/Book Title", journal_title),
        ("Issue", volume),
        ("Subjects", subjects),
    ];

    let mut block = format!("\t{rule}\n\tReference n°{id}\n\t{rule}\n", rule = BLOCK_RULE, id = visual_id);
    for (label, value) in fields {
        block.push_str(&format!("\t{}: {}\n", label, truncate(&value, MAX_FIELD_LENGTH)));
    }
    block.push_str(&format!("\t{}\n", BLOCK_RULE));
    block
}
