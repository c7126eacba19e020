//! Side-by-side HTML comparison of a candidate pair

use crate::model::{Reference, SimilarityResult};
use std::fmt::Write;

const LINE_BREAK: &str = "</br>";

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn cell(values: &[String]) -> String {
    values
        .iter()
        .map(|v| escape(v))
        .collect::<Vec<_>>()
        .join(LINE_BREAK)
}

fn date(value: Option<chrono::DateTime<chrono::Utc>>) -> Vec<String> {
    vec![value.map(|d| d.format("%d-%m-%Y").to_string()).unwrap_or_default()]
}

fn isbn(reference: &Reference) -> Vec<String> {
    let Some(book) = &reference.book else {
        return Vec::new();
    };
    let mut parts = Vec::new();
    if let Some(isbn10) = book.isbn10.as_deref().filter(|v| !v.is_empty()) {
        parts.push(format!("ISBN-10: {}", isbn10));
    }
    if let Some(isbn13) = book.isbn13.as_deref().filter(|v| !v.is_empty()) {
        parts.push(format!("ISBN-13: {}", isbn13));
    }
    parts
}

fn journal(reference: &Reference) -> Vec<String> {
    let Some(issue) = &reference.issue else {
        return Vec::new();
    };
    let title = issue
        .journal
        .titles
        .first()
        .map(String::as_str)
        .unwrap_or("no title");
    let issn = if issue.journal.issn.is_empty() {
        "no issn".to_string()
    } else {
        issue.journal.issn.join(", ")
    };
    vec![format!("{} ({})", title, issn)]
}

/// One row per compared aspect, as (label, left values, right values)
fn rows(left: &Reference, right: &Reference) -> Vec<(&'static str, Vec<String>, Vec<String>)> {
    let aspects: [(&'static str, fn(&Reference) -> Vec<String>); 16] = [
        ("Identifiers", |r| {
            r.identifiers
                .iter()
                .map(|id| format!("{}: {}", id.id_type, id.value))
                .collect()
        }),
        ("ISBN", isbn),
        ("Title(s)", |r| r.title_values().map(str::to_string).collect()),
        ("Subtitle(s)", |r| r.subtitles.iter().map(|s| s.value.clone()).collect()),
        ("Abstract(s)", |r| r.abstracts.iter().map(|a| a.value.clone()).collect()),
        ("Subjects", |r| {
            vec![r
                .subjects
                .iter()
                .filter_map(|s| s.pref_labels.first().map(|l| l.value.as_str()))
                .collect::<Vec<_>>()
                .join(", ")]
        }),
        ("Document Type(s)", |r| {
            let mut labels: Vec<String> = r.document_type.iter().map(|d| d.label.clone()).collect();
            labels.sort();
            labels.dedup();
            labels
        }),
        ("Contributions", |r| {
            r.contributions
                .iter()
                .map(|c| {
                    let who = if c.contributor.name.is_empty() {
                        c.contributor.source_identifier.clone().unwrap_or_default()
                    } else {
                        c.contributor.name.clone()
                    };
                    let role = if c.role.is_empty() { "Unknown" } else { c.role.as_str() };
                    format!("{}, role: {}", who, role)
                })
                .collect()
        }),
        ("Origin", |r| vec![format!("{} / {}", r.harvester, r.source_identifier)]),
        ("Publication Date", |r| date(r.issued)),
        ("Creation Date", |r| date(r.created)),
        ("Journal", journal),
        ("Volume", |r| r.issue.iter().filter_map(|i| i.volume.clone()).collect()),
        ("Number", |r| r.issue.iter().flat_map(|i| i.number.clone()).collect()),
        ("Pages", |r| r.pages.iter().cloned().collect()),
        ("Manifestations", |r| {
            r.manifestations
                .iter()
                .filter_map(|m| m.page.clone())
                .collect()
        }),
    ];
    aspects
        .iter()
        .map(|(label, extract)| (*label, extract(left), extract(right)))
        .collect()
}

/// Render the comparison table for a merged candidate.
pub fn comparison_table(result: &SimilarityResult) -> String {
    let left = &result.reference1;
    let right = &result.reference2;
    let mut html = String::from("<table class=\"duplicate-comparison\">\n");

    let _ = writeln!(html, "    <tr>");
    let _ = writeln!(html, "        <th>Field</th>");
    for (n, reference) in [(1, left), (2, right)] {
        let _ = writeln!(
            html,
            "        <th>Reference n°{} <span class=\"badge\">{}<br/>{}</span></th>",
            n,
            escape(&reference.harvester),
            escape(&reference.source_identifier)
        );
    }
    let _ = writeln!(html, "    </tr>");

    for (label, values1, values2) in rows(left, right) {
        let _ = writeln!(html, "    <tr>");
        let _ = writeln!(html, "        <td>{}</td>", label);
        let _ = writeln!(html, "        <td>{}</td>", cell(&values1));
        let _ = writeln!(html, "        <td>{}</td>", cell(&values2));
        let _ = writeln!(html, "    </tr>");
    }

    if !result.similarity_strategies().is_empty() {
        let _ = writeln!(html, "    <tr>");
        let _ = writeln!(
            html,
            "        <td colspan=\"3\" style=\"text-align: center;\">Similarity strategies : {}</td>",
            escape(&result.labelled_scores().join(", "))
        );
        let _ = writeln!(html, "    </tr>");
    }

    html.push_str("</table>\n");
    html
}
