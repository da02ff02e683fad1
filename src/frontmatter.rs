//! Frontmatter parsing and serialization.
//!
//! A content file is an optional metadata header followed by a Markdown/MDX
//! body:
//!
//! ```text
//! ---
//! title: Shipping a design system
//! publishedAt: 2024-01-01
//! tags: [design, systems]
//! ---
//!
//! # Body starts here
//! ```
//!
//! YAML headers are fenced with `---`, TOML headers with `+++`. Both decode
//! into one JSON value tree, so field extraction is written once.
//!
//! ## Tolerance
//!
//! Extraction never fails on a field: absent keys default, wrong-typed
//! optional keys are ignored, scalars where a list is expected become a
//! one-element list. Only a header that cannot be decoded at all (or one that
//! is not a mapping, or one that is never closed) makes [`parse`] return
//! `None`, which callers treat as "skip this file".
//!
//! ## Aliases
//!
//! | Field | Keys, first non-empty wins |
//! |-------|----------------------------|
//! | summary | `summary`, `description` |
//! | published | `publishedAt`, `published_at`, `date` |
//! | updated | `updatedAt`, `updated_at`, `updated` |
//! | tags | `tags` list; legacy `tag` only when the list is empty |
//! | categories | `categories` list, or a single `category` |

use crate::types::{Contributor, FaqEntry, Metadata, Reference, Status};
use serde_json::{Map, Value};

/// Result of splitting and decoding a content file.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub metadata: Metadata,
    pub body: String,
}

/// Header kinds recognized at the top of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fence {
    Yaml,
    Toml,
}

impl Fence {
    fn marker(self) -> &'static str {
        match self {
            Fence::Yaml => "---",
            Fence::Toml => "+++",
        }
    }
}

/// Split `text` into metadata and body. `None` means the header is malformed.
pub fn parse(text: &str) -> Option<Parsed> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let Some((fence, header, body)) = split(text)? else {
        return Some(Parsed {
            metadata: Metadata::default(),
            body: text.to_string(),
        });
    };

    let value = decode(fence, header)?;
    let metadata = match value {
        Value::Null => Metadata::default(),
        Value::Object(map) => extract(&map),
        _ => return None,
    };

    Some(Parsed {
        metadata,
        body: body.trim_start_matches(['\r', '\n']).to_string(),
    })
}

/// Locate the header block.
///
/// `Some(None)`: the file has no header. `Some(Some(..))`: fence, header text
/// and body. `None`: a header was opened and never closed.
#[allow(clippy::type_complexity)]
fn split(text: &str) -> Option<Option<(Fence, &str, &str)>> {
    let fence = [Fence::Yaml, Fence::Toml]
        .into_iter()
        .find(|f| first_line(text).trim_end() == f.marker());
    let Some(fence) = fence else {
        return Some(None);
    };

    let header_start = first_line(text).len();
    let mut offset = header_start;
    for line in text[header_start..].split_inclusive('\n') {
        if line.trim_end() == fence.marker() {
            let header = &text[header_start..offset];
            let body = &text[offset + line.len()..];
            return Some(Some((fence, header, body)));
        }
        offset += line.len();
    }

    None
}

/// First line of `text`, including its terminator.
fn first_line(text: &str) -> &str {
    match text.find('\n') {
        Some(end) => &text[..=end],
        None => text,
    }
}

fn decode(fence: Fence, header: &str) -> Option<Value> {
    if header.trim().is_empty() {
        return Some(Value::Null);
    }
    match fence {
        Fence::Yaml => serde_yaml::from_str(header).ok(),
        Fence::Toml => toml::from_str(header).ok(),
    }
}

fn extract(map: &Map<String, Value>) -> Metadata {
    let tags = {
        let list = list(map, "tags");
        if list.is_empty() { list_of(map, "tag") } else { list }
    };
    let categories = {
        let list = list(map, "categories");
        if list.is_empty() { list_of(map, "category") } else { list }
    };
    let status = match map.get("status").and_then(as_text) {
        Some(s) if s.eq_ignore_ascii_case("draft") => Status::Draft,
        _ if map.get("draft").and_then(as_flag) == Some(true) => Status::Draft,
        _ => Status::Published,
    };

    Metadata {
        title: text(map, &["title"]).unwrap_or_default(),
        summary: text(map, &["summary", "description"]),
        published_at: text(map, &["publishedAt", "published_at", "date"]),
        updated_at: text(map, &["updatedAt", "updated_at", "updated"]),
        image: text(map, &["image"]),
        images: list(map, "images"),
        tags,
        categories,
        team: records(map, "team", contributor),
        link: text(map, &["link"]),
        pillar: text(map, &["pillar"]),
        keywords: list(map, "keywords"),
        status,
        canonical: text(map, &["canonical"]),
        language: text(map, &["language", "lang"]),
        toc: map.get("toc").and_then(as_flag).unwrap_or(false),
        faq: records(map, "faq", faq_entry),
        references: records(map, "references", reference),
    }
}

/// Text form of a scalar. TOML datetimes arrive wrapped in a private table
/// and are unwrapped here.
fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Object(map) if map.len() == 1 => {
            return map.get("$__toml_private_datetime").and_then(as_text);
        }
        _ => return None,
    };
    if text.is_empty() { None } else { Some(text) }
}

fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| map.get(*k).and_then(as_text))
}

fn list(map: &Map<String, Value>, key: &str) -> Vec<String> {
    match map.get(key) {
        Some(Value::Array(values)) => values.iter().filter_map(as_text).collect(),
        Some(value) => as_text(value).into_iter().collect(),
        None => Vec::new(),
    }
}

/// A single legacy field read as a list.
fn list_of(map: &Map<String, Value>, key: &str) -> Vec<String> {
    map.get(key).and_then(as_text).into_iter().collect()
}

fn records<T>(map: &Map<String, Value>, key: &str, read: fn(&Value) -> Option<T>) -> Vec<T> {
    match map.get(key) {
        Some(Value::Array(values)) => values.iter().filter_map(read).collect(),
        _ => Vec::new(),
    }
}

fn contributor(value: &Value) -> Option<Contributor> {
    match value {
        Value::Object(map) => Some(Contributor {
            name: text(map, &["name"])?,
            url: text(map, &["url", "linkedIn"]),
            avatar: text(map, &["avatar"]),
        }),
        other => as_text(other).map(|name| Contributor {
            name,
            ..Contributor::default()
        }),
    }
}

fn faq_entry(value: &Value) -> Option<FaqEntry> {
    let Value::Object(map) = value else {
        return None;
    };
    Some(FaqEntry {
        question: text(map, &["question", "q"])?,
        answer: text(map, &["answer", "a"]).unwrap_or_default(),
    })
}

fn reference(value: &Value) -> Option<Reference> {
    match value {
        Value::Object(map) => {
            let url = text(map, &["url", "href"])?;
            Some(Reference {
                title: text(map, &["title"]).unwrap_or_else(|| url.clone()),
                url,
            })
        }
        other => as_text(other).map(|url| Reference {
            title: url.clone(),
            url,
        }),
    }
}

/// Write `metadata` and `body` back out as a YAML-fronted document.
pub fn serialize(metadata: &Metadata, body: &str) -> Result<String, serde_yaml::Error> {
    let header = serde_yaml::to_string(metadata)?;
    let mut doc = String::with_capacity(header.len() + body.len() + 10);
    doc.push_str("---\n");
    doc.push_str(&header);
    if !header.ends_with('\n') {
        doc.push('\n');
    }
    doc.push_str("---\n\n");
    doc.push_str(body.trim_start_matches(['\r', '\n']));
    if !doc.ends_with('\n') {
        doc.push('\n');
    }
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_header_is_split_from_body() {
        let parsed = parse("---\ntitle: Hello\nsummary: First post\n---\n\n# Hello\n\nBody.\n").unwrap();
        assert_eq!(parsed.metadata.title, "Hello");
        assert_eq!(parsed.metadata.summary.as_deref(), Some("First post"));
        assert_eq!(parsed.body, "# Hello\n\nBody.\n");
    }

    #[test]
    fn toml_header_is_supported() {
        let parsed = parse("+++\ntitle = \"Hi\"\ntags = [\"a\", \"b\"]\ndate = 2024-02-03\n+++\nBody").unwrap();
        assert_eq!(parsed.metadata.title, "Hi");
        assert_eq!(parsed.metadata.tags, vec!["a", "b"]);
        assert_eq!(parsed.metadata.published_at.as_deref(), Some("2024-02-03"));
        assert_eq!(parsed.body, "Body");
    }

    #[test]
    fn file_without_header_is_all_body() {
        let parsed = parse("Just text.\n").unwrap();
        assert_eq!(parsed.metadata, Metadata::default());
        assert_eq!(parsed.body, "Just text.\n");
    }

    #[test]
    fn empty_header_yields_defaults() {
        let parsed = parse("---\n---\nBody").unwrap();
        assert_eq!(parsed.metadata, Metadata::default());
        assert_eq!(parsed.body, "Body");
    }

    #[test]
    fn unclosed_header_is_malformed() {
        assert_eq!(parse("---\ntitle: Oops\n\nBody"), None);
    }

    #[test]
    fn invalid_yaml_is_malformed() {
        assert_eq!(parse("---\ntitle: [unclosed\n---\nBody"), None);
    }

    #[test]
    fn non_mapping_header_is_malformed() {
        assert_eq!(parse("---\n- a\n- b\n---\nBody"), None);
    }

    #[test]
    fn crlf_line_endings() {
        let parsed = parse("---\r\ntitle: Windows\r\n---\r\n\r\nBody\r\n").unwrap();
        assert_eq!(parsed.metadata.title, "Windows");
        assert_eq!(parsed.body, "Body\r\n");
    }

    #[test]
    fn tag_list_wins_over_legacy_tag() {
        let parsed = parse("---\ntag: legacy\ntags: [one, two]\n---\n").unwrap();
        assert_eq!(parsed.metadata.tags, vec!["one", "two"]);
    }

    #[test]
    fn legacy_tag_used_when_no_list() {
        let parsed = parse("---\ntag: legacy\n---\n").unwrap();
        assert_eq!(parsed.metadata.tags, vec!["legacy"]);
    }

    #[test]
    fn scalar_tags_become_single_element_list() {
        let parsed = parse("---\ntags: solo\ncategory: Essays\n---\n").unwrap();
        assert_eq!(parsed.metadata.tags, vec!["solo"]);
        assert_eq!(parsed.metadata.categories, vec!["Essays"]);
    }

    #[test]
    fn published_at_and_date_are_interchangeable() {
        let a = parse("---\npublishedAt: 2024-01-01\n---\n").unwrap();
        let b = parse("---\ndate: 2024-01-01\n---\n").unwrap();
        assert_eq!(a.metadata.published_at, b.metadata.published_at);
    }

    #[test]
    fn empty_published_at_falls_through_to_date() {
        let parsed = parse("---\npublishedAt: \"\"\ndate: 2023-05-06\n---\n").unwrap();
        assert_eq!(parsed.metadata.published_at.as_deref(), Some("2023-05-06"));
    }

    #[test]
    fn wrong_typed_fields_are_ignored() {
        let parsed = parse("---\ntitle: {nested: true}\nimage: [a, b]\ntoc: maybe\n---\n").unwrap();
        assert_eq!(parsed.metadata.title, "");
        assert_eq!(parsed.metadata.image, None);
        assert!(!parsed.metadata.toc);
    }

    #[test]
    fn team_accepts_records_and_names() {
        let parsed = parse(
            "---\nteam:\n  - name: Ana\n    url: https://ana.dev\n    avatar: /ana.jpg\n  - Bruno\n  - url: https://nameless\n---\n",
        )
        .unwrap();
        let team = &parsed.metadata.team;
        assert_eq!(team.len(), 2);
        assert_eq!(team[0].name, "Ana");
        assert_eq!(team[0].avatar.as_deref(), Some("/ana.jpg"));
        assert_eq!(team[1].name, "Bruno");
        assert_eq!(team[1].url, None);
    }

    #[test]
    fn editorial_fields() {
        let parsed = parse(
            "---\npillar: craft\nkeywords: [rust, ssg]\nstatus: Draft\ncanonical: https://x.dev/a\nlanguage: pt-BR\ntoc: true\nfaq:\n  - question: Why?\n    answer: Because.\nreferences:\n  - title: Docs\n    url: https://docs.rs\n  - https://example.com\n---\n",
        )
        .unwrap();
        let m = &parsed.metadata;
        assert_eq!(m.pillar.as_deref(), Some("craft"));
        assert_eq!(m.keywords, vec!["rust", "ssg"]);
        assert_eq!(m.status, Status::Draft);
        assert_eq!(m.canonical.as_deref(), Some("https://x.dev/a"));
        assert_eq!(m.language.as_deref(), Some("pt-BR"));
        assert!(m.toc);
        assert_eq!(m.faq[0].question, "Why?");
        assert_eq!(m.references.len(), 2);
        assert_eq!(m.references[1].title, "https://example.com");
    }

    #[test]
    fn draft_flag_alias() {
        let parsed = parse("---\ndraft: true\n---\n").unwrap();
        assert_eq!(parsed.metadata.status, Status::Draft);
    }

    #[test]
    fn serialize_writes_frontmatter_keys() {
        let metadata = Metadata {
            title: "Hello".into(),
            published_at: Some("2024-01-01".into()),
            tags: vec!["a".into()],
            ..Metadata::default()
        };
        let doc = serialize(&metadata, "Body text").unwrap();
        assert!(doc.starts_with("---\ntitle: Hello\n"));
        assert!(doc.contains("publishedAt:"));
        assert!(!doc.contains("published_at"));
        assert!(doc.ends_with("---\n\nBody text\n"));

        let reparsed = parse(&doc).unwrap();
        assert_eq!(reparsed.metadata, metadata);
    }
}
