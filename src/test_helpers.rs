//! Shared test utilities for the folio test suite.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_file(tmp.path(), "blog/hello.md", "---\ntitle: Hello\n---\n");
//!
//! let item = ItemBuilder::new("hello").tags(&["rust"]).date("2024-01-01").build();
//! assert_eq!(slugs(&[item]), vec!["hello"]);
//! ```

use std::path::Path;

use crate::types::{ContentItem, Metadata, Status};

// =========================================================================
// Filesystem fixtures
// =========================================================================

/// Write `content` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: impl AsRef<[u8]>) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

// =========================================================================
// Bulk extractors
// =========================================================================

pub fn slugs(items: &[ContentItem]) -> Vec<&str> {
    items.iter().map(|i| i.slug.as_str()).collect()
}

pub fn slugs_of<'a>(items: &[&'a ContentItem]) -> Vec<&'a str> {
    items.iter().map(|i| i.slug.as_str()).collect()
}

// =========================================================================
// In-memory items
// =========================================================================

/// Builds a [`ContentItem`] without touching the filesystem.
pub struct ItemBuilder {
    item: ContentItem,
}

impl ItemBuilder {
    pub fn new(slug: &str) -> Self {
        Self {
            item: ContentItem {
                slug: slug.to_string(),
                source: format!("{slug}.mdx"),
                metadata: Metadata {
                    title: slug.to_string(),
                    ..Metadata::default()
                },
                body: String::new(),
            },
        }
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.item.metadata = metadata;
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.item.metadata.title = title.to_string();
        self
    }

    pub fn date(mut self, date: &str) -> Self {
        self.item.metadata.published_at = Some(date.to_string());
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.item.metadata.tags = to_strings(tags);
        self
    }

    pub fn categories(mut self, categories: &[&str]) -> Self {
        self.item.metadata.categories = to_strings(categories);
        self
    }

    pub fn keywords(mut self, keywords: &[&str]) -> Self {
        self.item.metadata.keywords = to_strings(keywords);
        self
    }

    pub fn pillar(mut self, pillar: &str) -> Self {
        self.item.metadata.pillar = Some(pillar.to_string());
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.item.metadata.status = status;
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.item.body = body.to_string();
        self
    }

    pub fn build(self) -> ContentItem {
        self.item
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
