//! Reference: one bibliographic record harvested from one source system

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A typed identifier carried by a reference (doi, uri, hal, nnt, ...).
///
/// Types are not unique within a reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceIdentifier {
    #[serde(rename = "type")]
    pub id_type: String,
    pub value: String,
}

impl ReferenceIdentifier {
    pub fn new(id_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id_type: id_type.into(),
            value: value.into(),
        }
    }
}

/// A web manifestation of a reference (landing page)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceManifestation {
    #[serde(default)]
    pub page: Option<String>,
}

/// A language-tagged text value (titles, subtitles, abstracts, labels)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralText {
    pub value: String,
    #[serde(default)]
    pub language: Option<String>,
}

impl LiteralText {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            language: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

pub type Title = LiteralText;
pub type Subtitle = LiteralText;
pub type Abstract = LiteralText;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentType {
    #[serde(default)]
    pub uri: String,
    pub label: String,
}

impl DocumentType {
    pub fn new(uri: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Journal {
    #[serde(default)]
    pub issn: Vec<String>,
    #[serde(default)]
    pub eissn: Vec<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub titles: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub volume: Option<String>,
    #[serde(default)]
    pub number: Vec<String>,
    #[serde(default)]
    pub rights: Option<String>,
    #[serde(default, deserialize_with = "flexible_date")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub journal: Journal,
}

/// Book-level metadata, present for books and chapters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub title_variants: Vec<String>,
    #[serde(default)]
    pub isbn10: Option<String>,
    #[serde(default)]
    pub isbn13: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
}

/// A person contributing to a reference.
///
/// `last_name` is derived from `name` by [`Reference::compute_last_names`],
/// never taken as authoritative input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contributor {
    pub source: String,
    #[serde(default)]
    pub source_identifier: Option<String>,
    pub name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub name_variants: Vec<String>,
}

impl Contributor {
    pub fn new(source: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            source_identifier: None,
            name: name.into(),
            last_name: None,
            name_variants: Vec::new(),
        }
    }

    pub fn with_source_identifier(mut self, id: impl Into<String>) -> Self {
        self.source_identifier = Some(id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    #[serde(default)]
    pub rank: Option<i64>,
    pub contributor: Contributor,
    pub role: String,
}

/// A subject concept with preferred and alternate labels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub pref_labels: Vec<LiteralText>,
    #[serde(default)]
    pub alt_labels: Vec<LiteralText>,
}

/// A bibliographic record.
///
/// Its global identity is [`Reference::unique_identifier`]: two instances
/// with the same key are the same logical record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub source_identifier: String,
    pub harvester: String,
    #[serde(default)]
    pub identifiers: Vec<ReferenceIdentifier>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub manifestations: Vec<ReferenceManifestation>,
    #[serde(default)]
    pub titles: Vec<Title>,
    #[serde(default)]
    pub subtitles: Vec<Subtitle>,
    #[serde(default)]
    pub abstracts: Vec<Abstract>,
    #[serde(default)]
    pub subjects: Vec<Concept>,
    #[serde(default)]
    pub document_type: Vec<DocumentType>,
    #[serde(default)]
    pub contributions: Vec<Contribution>,
    #[serde(default)]
    pub similarity_strategies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "flexible_date")]
    pub issued: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "flexible_date")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub issue: Option<Issue>,
    #[serde(default)]
    pub pages: Option<String>,
    #[serde(default)]
    pub book: Option<Book>,
}

impl Reference {
    pub fn new(harvester: impl Into<String>, source_identifier: impl Into<String>) -> Self {
        Self {
            harvester: harvester.into(),
            source_identifier: source_identifier.into(),
            ..Default::default()
        }
    }

    /// Global identity key: `harvester-source_identifier`
    pub fn unique_identifier(&self) -> String {
        format!("{}-{}", self.harvester, self.source_identifier)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.titles.push(LiteralText::new(title));
        self
    }

    pub fn with_abstract(mut self, text: impl Into<String>) -> Self {
        self.abstracts.push(LiteralText::new(text));
        self
    }

    pub fn with_identifier(mut self, id_type: impl Into<String>, value: impl Into<String>) -> Self {
        self.identifiers.push(ReferenceIdentifier::new(id_type, value));
        self
    }

    pub fn with_document_type(mut self, label: impl Into<String>) -> Self {
        self.document_type.push(DocumentType::new("", label));
        self
    }

    pub fn with_contributor(mut self, name: impl Into<String>) -> Self {
        let rank = self.contributions.len() as i64;
        self.contributions.push(Contribution {
            rank: Some(rank),
            contributor: Contributor::new(self.harvester.clone(), name),
            role: "Author".to_string(),
        });
        self
    }

    pub fn with_manifestation(mut self, page: impl Into<String>) -> Self {
        self.manifestations.push(ReferenceManifestation {
            page: Some(page.into()),
        });
        self
    }

    pub fn with_book(mut self, book: Book) -> Self {
        self.book = Some(book);
        self
    }

    /// Populate `last_name` on every contributor that has a name.
    pub fn compute_last_names(&mut self) {
        for contribution in &mut self.contributions {
            let name = contribution.contributor.name.trim();
            if !name.is_empty() {
                contribution.contributor.last_name = Some(last_name_of(name));
            }
        }
    }

    /// Names of all contributors, in contribution order
    pub fn contributor_names(&self) -> impl Iterator<Item = &str> {
        self.contributions.iter().map(|c| c.contributor.name.as_str())
    }

    /// Contributor last names, derived from the name when not yet computed
    pub fn last_names(&self) -> Vec<String> {
        self.contributions
            .iter()
            .filter_map(|c| match &c.contributor.last_name {
                Some(last) => Some(last.clone()),
                None => {
                    let name = c.contributor.name.trim();
                    (!name.is_empty()).then(|| last_name_of(name))
                }
            })
            .collect()
    }

    pub fn title_values(&self) -> impl Iterator<Item = &str> {
        self.titles.iter().map(|t| t.value.as_str())
    }
}

/// "Last, First" yields the part before the comma, otherwise the last word.
fn last_name_of(name: &str) -> String {
    if let Some((last, _)) = name.split_once(',') {
        return last.trim().to_string();
    }
    name.split_whitespace()
        .last()
        .unwrap_or(name)
        .to_string()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts RFC 3339, naive `YYYY-MM-DDTHH:MM:SS[.f]` (taken as UTC) or a plain date.
fn flexible_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    parse_date(raw)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognised date: {}", raw)))
}

pub(crate) fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
