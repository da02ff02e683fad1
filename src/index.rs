//! Tag and category indexing, filtering, and related-content scoring.
//!
//! Everything here is derived from a scanned collection on demand; nothing is
//! stored. Tag and category matching is exact and case-sensitive.

use crate::config::RelatedConfig;
use crate::types::ContentItem;
use std::collections::{BTreeMap, BTreeSet};

/// Every tag used in `items`, deduplicated and sorted.
pub fn list_tags(items: &[ContentItem]) -> Vec<String> {
    collect_sorted(items.iter().flat_map(|i| &i.metadata.tags))
}

/// Every category used in `items`, deduplicated and sorted.
pub fn list_categories(items: &[ContentItem]) -> Vec<String> {
    collect_sorted(items.iter().flat_map(|i| &i.metadata.categories))
}

fn collect_sorted<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
    values
        .map(String::as_str)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Number of items per tag, for tag clouds.
pub fn tag_counts(items: &[ContentItem]) -> BTreeMap<String, usize> {
    count_items(items.iter().map(|i| &i.metadata.tags))
}

pub fn category_counts(items: &[ContentItem]) -> BTreeMap<String, usize> {
    count_items(items.iter().map(|i| &i.metadata.categories))
}

fn count_items<'a>(per_item: impl Iterator<Item = &'a Vec<String>>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for values in per_item {
        let unique: BTreeSet<&String> = values.iter().collect();
        for value in unique {
            *counts.entry(value.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Items tagged `tag`, newest first.
pub fn filter_by_tag<'a>(tag: &str, items: &'a [ContentItem]) -> Vec<&'a ContentItem> {
    newest_first(items.iter().filter(|i| i.metadata.tags.iter().any(|t| t == tag)))
}

/// Items in `category`, newest first.
pub fn filter_by_category<'a>(category: &str, items: &'a [ContentItem]) -> Vec<&'a ContentItem> {
    newest_first(
        items
            .iter()
            .filter(|i| i.metadata.categories.iter().any(|c| c == category)),
    )
}

fn newest_first<'a>(items: impl Iterator<Item = &'a ContentItem>) -> Vec<&'a ContentItem> {
    let mut matches: Vec<&ContentItem> = items.collect();
    matches.sort_by_key(|item| std::cmp::Reverse(item.sort_key()));
    matches
}

/// Items fit for public listings.
pub fn published(items: &[ContentItem]) -> Vec<&ContentItem> {
    items.iter().filter(|i| !i.is_draft()).collect()
}

/// A candidate and its weighted overlap with the current item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelatedScore<'a> {
    pub item: &'a ContentItem,
    pub score: u32,
}

/// Related items with the stock weights (5 pillar, 3 category, 2 tag, 1 keyword).
pub fn related_items<'a>(
    current: &ContentItem,
    candidates: &'a [ContentItem],
    limit: usize,
) -> Vec<&'a ContentItem> {
    let weights = RelatedConfig {
        limit,
        ..RelatedConfig::default()
    };
    score_related(current, candidates, &weights)
        .into_iter()
        .map(|scored| scored.item)
        .collect()
}

/// Score candidates against `current` and keep the best `weights.limit`.
///
/// The current item (by slug) and drafts are never candidates. Only positive
/// scores are kept. Equal scores keep candidate order.
pub fn score_related<'a>(
    current: &ContentItem,
    candidates: &'a [ContentItem],
    weights: &RelatedConfig,
) -> Vec<RelatedScore<'a>> {
    let mut scored: Vec<RelatedScore<'a>> = candidates
        .iter()
        .filter(|c| c.slug != current.slug && !c.is_draft())
        .map(|item| RelatedScore {
            item,
            score: score(current, item, weights),
        })
        .filter(|s| s.score > 0)
        .collect();

    scored.sort_by_key(|s| std::cmp::Reverse(s.score));
    scored.truncate(weights.limit);
    scored
}

fn score(current: &ContentItem, candidate: &ContentItem, weights: &RelatedConfig) -> u32 {
    let a = &current.metadata;
    let b = &candidate.metadata;

    let same_pillar = matches!((&a.pillar, &b.pillar), (Some(x), Some(y)) if x == y);

    [
        (weights.pillar, u32::from(same_pillar)),
        (weights.category, overlap(&a.categories, &b.categories)),
        (weights.tag, overlap(&a.tags, &b.tags)),
        (weights.keyword, overlap(&a.keywords, &b.keywords)),
    ]
    .into_iter()
    .fold(0u32, |total, (weight, hits)| total.saturating_add(weight.saturating_mul(hits)))
}

/// Number of distinct values present in both lists.
fn overlap(a: &[String], b: &[String]) -> u32 {
    let left: BTreeSet<&String> = a.iter().collect();
    let right: BTreeSet<&String> = b.iter().collect();
    left.intersection(&right).count() as u32
}
