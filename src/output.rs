//! CLI output formatting for every command.
//!
//! Output is **information-centric, not file-centric**: every item leads
//! with its positional index, title and date, and the source file follows
//! as an indented `Source:` line. The same helpers format items in scan,
//! related and generate output, so one item looks the same everywhere.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Blog (2 items)
//! 001 Hello World · 2024-03-01
//!     Source: blog/hello-world.mdx
//!     Tags: rust, web
//! 002 Notes on drafts
//!     Source: blog/notes.md
//!     Status: draft
//! ```
//!
//! ## Related
//!
//! ```text
//! Related to Hello World
//! 001 Second Post · 2024-02-01 (score 5)
//!     Source: blog/second-post.md
//! ```
//!
//! ## Route
//!
//! ```text
//! /admin/posts → locked: Incorrect password.
//! ```
//!
//! ## Generate
//!
//! ```text
//! Blog → /blog/ (12 items, 1 draft skipped)
//!     8 tag pages, 3 category pages
//!
//! Generated 26 pages
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::gate::GateState;
use crate::generate::GenerateSummary;
use crate::index::RelatedScore;
use crate::scan::ScanReport;
use crate::types::ContentItem;
use std::collections::BTreeMap;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{n} {}", if n == 1 { one } else { many })
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Item header: index, title and publication date when there is one.
///
/// ```text
/// 001 Hello World · 2024-03-01
/// 002 Undated note
/// ```
fn item_header(index: usize, item: &ContentItem) -> String {
    match item.published_at() {
        Some(date) => format!(
            "{} {} · {}",
            format_index(index),
            item.metadata.title,
            date.format("%Y-%m-%d")
        ),
        None => format!("{} {}", format_index(index), item.metadata.title),
    }
}

fn item_context(item: &ContentItem, depth: usize) -> Vec<String> {
    let pad = indent(depth);
    let mut lines = vec![format!("{pad}Source: {}", item.source)];
    if let Some(summary) = &item.metadata.summary {
        lines.push(format!("{pad}Summary: {}", truncate_desc(summary, 60)));
    }
    if !item.metadata.tags.is_empty() {
        lines.push(format!("{pad}Tags: {}", item.metadata.tags.join(", ")));
    }
    if !item.metadata.categories.is_empty() {
        lines.push(format!("{pad}Categories: {}", item.metadata.categories.join(", ")));
    }
    if item.is_draft() {
        lines.push(format!("{pad}Status: draft"));
    }
    lines
}

// ============================================================================
// scan
// ============================================================================

pub fn format_scan_output(title: &str, items: &[ContentItem]) -> Vec<String> {
    let mut lines = vec![format!("{title} ({})", plural(items.len(), "item", "items"))];
    for (i, item) in items.iter().enumerate() {
        lines.push(item_header(i + 1, item));
        lines.extend(item_context(item, 1));
    }
    lines
}

pub fn print_scan_output(title: &str, items: &[ContentItem]) {
    for line in format_scan_output(title, items) {
        println!("{}", line);
    }
}

// ============================================================================
// tags
// ============================================================================

pub fn format_tags_output(
    tags: &BTreeMap<String, usize>,
    categories: &BTreeMap<String, usize>,
) -> Vec<String> {
    let mut lines = Vec::new();
    for (heading, terms) in [("Tags", tags), ("Categories", categories)] {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(heading.to_string());
        if terms.is_empty() {
            lines.push(format!("{}(none)", indent(1)));
        }
        for (term, count) in terms {
            lines.push(format!("{}{term} ({count})", indent(1)));
        }
    }
    lines
}

pub fn print_tags_output(tags: &BTreeMap<String, usize>, categories: &BTreeMap<String, usize>) {
    for line in format_tags_output(tags, categories) {
        println!("{}", line);
    }
}

// ============================================================================
// related
// ============================================================================

pub fn format_related_output(current: &ContentItem, related: &[RelatedScore<'_>]) -> Vec<String> {
    let mut lines = vec![format!("Related to {}", current.metadata.title)];
    if related.is_empty() {
        lines.push(format!("{}(nothing shares a pillar, category, tag or keyword)", indent(1)));
    }
    for (i, scored) in related.iter().enumerate() {
        lines.push(format!("{} (score {})", item_header(i + 1, scored.item), scored.score));
        lines.push(format!("{}Source: {}", indent(1), scored.item.source));
    }
    lines
}

pub fn print_related_output(current: &ContentItem, related: &[RelatedScore<'_>]) {
    for line in format_related_output(current, related) {
        println!("{}", line);
    }
}

// ============================================================================
// route
// ============================================================================

pub fn format_route_output(path: &str, state: &GateState) -> Vec<String> {
    let verdict = match state {
        GateState::Loading => "checking session".to_string(),
        GateState::RouteDisabled => "not found (route disabled)".to_string(),
        GateState::Open => "open".to_string(),
        GateState::Unlocked => "unlocked".to_string(),
        GateState::LockPending { error: None } => "locked (secret required)".to_string(),
        GateState::LockPending { error: Some(message) } => format!("locked: {message}"),
    };
    vec![format!("{path} → {verdict}")]
}

pub fn print_route_output(path: &str, state: &GateState) {
    for line in format_route_output(path, state) {
        println!("{}", line);
    }
}

// ============================================================================
// check
// ============================================================================

pub fn format_check_output(reports: &[(String, ScanReport)]) -> Vec<String> {
    let mut lines = vec!["Config OK".to_string()];
    for (title, report) in reports {
        let mut line = format!(
            "{title}: {} loaded",
            plural(report.items, "item", "items")
        );
        if report.skipped() > 0 {
            line.push_str(&format!(", {} skipped (see warnings)", plural(report.skipped(), "file", "files")));
        }
        lines.push(line);
    }
    lines
}

pub fn print_check_output(reports: &[(String, ScanReport)]) {
    for line in format_check_output(reports) {
        println!("{}", line);
    }
}

// ============================================================================
// build
// ============================================================================

pub fn format_generate_output(summary: &GenerateSummary, titles: &BTreeMap<String, String>) -> Vec<String> {
    let mut lines = Vec::new();
    for collection in &summary.collections {
        let title = titles.get(&collection.name).unwrap_or(&collection.name);
        let mut header = format!(
            "{title} → {}/ ({}",
            collection.route.trim_end_matches('/'),
            plural(collection.items, "item", "items")
        );
        if collection.drafts > 0 {
            header.push_str(&format!(", {} skipped", plural(collection.drafts, "draft", "drafts")));
        }
        header.push(')');
        lines.push(header);
        lines.push(format!(
            "{}{}, {}",
            indent(1),
            plural(collection.tag_pages, "tag page", "tag pages"),
            plural(collection.category_pages, "category page", "category pages")
        ));
    }
    lines.push(String::new());
    lines.push(format!("Generated {}", plural(summary.pages(), "page", "pages")));
    lines
}

pub fn print_generate_output(summary: &GenerateSummary, titles: &BTreeMap<String, String>) {
    for line in format_generate_output(summary, titles) {
        println!("{}", line);
    }
}
