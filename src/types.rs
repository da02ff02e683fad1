//! Shared content types.
//!
//! A [`ContentItem`] is built fresh by every scan and never mutated
//! afterwards. Its [`Metadata`] serializes back to the frontmatter key names
//! (`publishedAt`, `updatedAt`, ...) so the admin editor can write it out
//! unchanged.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// One content document: a blog post, a work case study, a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Filename stem, unique within its directory.
    pub slug: String,
    /// Path of the source file relative to the content root.
    pub source: String,
    pub metadata: Metadata,
    /// Raw markup after the frontmatter block.
    pub body: String,
}

impl ContentItem {
    pub fn is_draft(&self) -> bool {
        self.metadata.status == Status::Draft
    }

    /// Publication instant, if the item carries a date that parses.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.metadata.published_at.as_deref().and_then(parse_date)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.metadata.updated_at.as_deref().and_then(parse_date)
    }

    /// Sort key for date ordering. `None` orders before every date, so
    /// undated items are the oldest.
    pub fn sort_key(&self) -> Option<DateTime<Utc>> {
        self.published_at()
    }
}

/// Frontmatter fields after alias resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Metadata {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Cover image, a local path or an absolute URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub team: Vec<Contributor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Editorial top-level grouping, weighted heavily in related scoring.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pillar: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Render a table of contents above the body.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub toc: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub faq: Vec<FaqEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Published,
    Draft,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contributor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reference {
    pub title: String,
    pub url: String,
}

/// Parse an ISO-8601 date as written in frontmatter.
///
/// Accepts RFC 3339 (`2024-01-01T10:00:00Z`), a naive date-time
/// (`2024-01-01T10:00:00`, read as UTC) and a plain date (`2024-01-01`,
/// midnight UTC). Anything else is `None`.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
