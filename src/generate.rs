//! Static site generation.
//!
//! Renders every configured collection from the content repository into
//! plain HTML. Item bodies go through the rendering adapter
//! ([`crate::adapter`]) and the resulting node tree is turned into markup
//! here.
//!
//! ## Generated Pages
//!
//! - **Home** (`/index.html`): latest items of each collection
//! - **Collection index** (`/{route}/index.html`): published items, newest first
//! - **Item pages** (`/{route}/{slug}/index.html`): title, dates, cover, body,
//!   optional table of contents, team, FAQ, references, tags, related items
//! - **Tag pages** (`/{route}/tag/{tag}/index.html`)
//! - **Category pages** (`/{route}/category/{category}/index.html`)
//! - **Listing data** (`/{route}/index.json`): item metadata for client-side search
//!
//! Drafts are never rendered and never appear in listings, tag pages or
//! related items.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html
//! ├── blog/
//! │   ├── index.html
//! │   ├── index.json
//! │   ├── hello-world/index.html
//! │   ├── tag/rust/index.html
//! │   └── category/engineering/index.html
//! └── work/
//!     └── ...
//! ```
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Everything is escaped except [`Node::Html`] passthrough, which is raw
//! markup from the content author.

use crate::adapter::{self, AdapterContext, Node, TocEntry};
use crate::config::{CollectionConfig, ConfigError, SiteConfig};
use crate::index;
use crate::naming;
use crate::repository::ContentRepository;
use crate::types::ContentItem;
use chrono::{DateTime, Utc};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// What one build wrote, per collection.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateSummary {
    pub collections: Vec<CollectionSummary>,
}

impl GenerateSummary {
    /// HTML pages written, including the home page.
    pub fn pages(&self) -> usize {
        1 + self
            .collections
            .iter()
            .map(|c| 1 + c.items + c.tag_pages + c.category_pages)
            .sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionSummary {
    pub name: String,
    pub route: String,
    pub items: usize,
    pub drafts: usize,
    pub tag_pages: usize,
    pub category_pages: usize,
}

/// One entry of `index.json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListingEntry<'a> {
    slug: &'a str,
    url: String,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    published_at: Option<String>,
    tags: &'a [String],
    categories: &'a [String],
}

const CSS: &str = include_str!("../static/style.css");

/// Shared inputs for every page of one build.
struct Site<'a> {
    config: &'a SiteConfig,
    ctx: AdapterContext,
}

pub fn generate(
    config: &SiteConfig,
    repository: &ContentRepository,
    output_dir: &Path,
) -> Result<GenerateSummary, GenerateError> {
    // Collection routes must be distinct and below the home page
    config.validate()?;
    let site = Site {
        config,
        ctx: AdapterContext::new(&config.site.origin),
    };
    fs::create_dir_all(output_dir)?;

    let mut summary = GenerateSummary::default();
    let mut latest: Vec<(&CollectionConfig, Vec<ContentItem>)> = Vec::new();

    for (name, collection) in &config.collections {
        let items = repository.items(&collection.dir);
        let live: Vec<ContentItem> = index::published(&items).into_iter().cloned().collect();
        let drafts = items.len() - live.len();

        let dir = route_dir(output_dir, &collection.route);
        let (tag_pages, category_pages) = generate_collection(&site, collection, &live, &dir)?;

        info!(
            collection = %name,
            items = live.len(),
            drafts,
            tag_pages,
            category_pages,
            "generated collection"
        );
        summary.collections.push(CollectionSummary {
            name: name.clone(),
            route: collection.route.clone(),
            items: live.len(),
            drafts,
            tag_pages,
            category_pages,
        });
        latest.push((collection, live.into_iter().take(5).collect()));
    }

    write_page(output_dir, render_home(&site, &latest))?;
    info!(output = %output_dir.display(), pages = summary.pages(), "site generated");
    Ok(summary)
}

/// Write every page of one collection. Returns (tag pages, category pages).
fn generate_collection(
    site: &Site<'_>,
    collection: &CollectionConfig,
    live: &[ContentItem],
    dir: &Path,
) -> Result<(usize, usize), GenerateError> {
    write_page(dir, render_collection_index(site, collection, live))?;
    write_listing(dir, collection, live)?;

    live.par_iter().try_for_each(|item| -> Result<(), GenerateError> {
        let related = index::score_related(item, live, &site.config.related);
        let related: Vec<&ContentItem> = related.into_iter().map(|r| r.item).collect();
        write_page(&dir.join(&item.slug), render_item_page(site, collection, item, &related))?;
        debug!(slug = %item.slug, "rendered item page");
        Ok(())
    })?;

    let tags = group_by_anchor(index::list_tags(live));
    for (slug, labels) in &tags {
        let items = matching(labels, |label| index::filter_by_tag(label, live));
        let page = render_term_page(site, collection, "Tagged", &labels.join(" / "), &items);
        write_page(&dir.join("tag").join(slug), page)?;
    }

    let categories = group_by_anchor(index::list_categories(live));
    for (slug, labels) in &categories {
        let items = matching(labels, |label| index::filter_by_category(label, live));
        let page = render_term_page(site, collection, "Category", &labels.join(" / "), &items);
        write_page(&dir.join("category").join(slug), page)?;
    }

    Ok((tags.len(), categories.len()))
}

/// Terms keyed by their URL slug. Terms that slug the same ("Rust", "rust")
/// share one page; terms with an empty slug get none.
fn group_by_anchor(terms: Vec<String>) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for term in terms {
        let slug = naming::anchor_slug(&term);
        if !slug.is_empty() {
            groups.entry(slug).or_default().push(term);
        }
    }
    groups
}

/// Items matching any label, newest first, each once.
fn matching<'a>(
    labels: &[String],
    filter: impl Fn(&str) -> Vec<&'a ContentItem>,
) -> Vec<&'a ContentItem> {
    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for label in labels {
        for item in filter(label) {
            if seen.insert(item.slug.as_str()) {
                items.push(item);
            }
        }
    }
    items.sort_by_key(|item| std::cmp::Reverse(item.sort_key()));
    items
}

fn write_page(dir: &Path, markup: Markup) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join("index.html"), markup.into_string())
}

fn write_listing(
    dir: &Path,
    collection: &CollectionConfig,
    live: &[ContentItem],
) -> Result<(), GenerateError> {
    let entries: Vec<ListingEntry<'_>> = live
        .iter()
        .map(|item| ListingEntry {
            slug: &item.slug,
            url: item_url(&collection.route, &item.slug),
            title: &item.metadata.title,
            summary: item.metadata.summary.as_deref(),
            published_at: item.published_at().map(|d| d.to_rfc3339()),
            tags: &item.metadata.tags,
            categories: &item.metadata.categories,
        })
        .collect();
    fs::write(dir.join("index.json"), serde_json::to_string_pretty(&entries)?)?;
    Ok(())
}

// ============================================================================
// URLs
// ============================================================================

fn route_dir(output_dir: &Path, route: &str) -> PathBuf {
    route
        .split('/')
        .filter(|s| !s.is_empty())
        .fold(output_dir.to_path_buf(), |dir, s| dir.join(s))
}

fn route_base(route: &str) -> &str {
    route.trim_end_matches('/')
}

pub fn item_url(route: &str, slug: &str) -> String {
    format!("{}/{slug}/", route_base(route))
}

pub fn tag_url(route: &str, tag: &str) -> String {
    format!("{}/tag/{}/", route_base(route), naming::anchor_slug(tag))
}

pub fn category_url(route: &str, category: &str) -> String {
    format!("{}/category/{}/", route_base(route), naming::anchor_slug(category))
}

// ============================================================================
// HTML Components
// ============================================================================

fn base_document(title: &str, description: Option<&str>, canonical: Option<&str>, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                @if let Some(description) = description {
                    meta name="description" content=(description);
                }
                @if let Some(canonical) = canonical {
                    link rel="canonical" href=(canonical);
                }
                style { (PreEscaped(CSS)) }
            }
            body {
                (content)
            }
        }
    }
}

fn site_header(site: &Site<'_>, current_route: Option<&str>) -> Markup {
    html! {
        header.site-header {
            a.site-title href="/" { (site.config.site.title) }
            nav.site-nav {
                @for collection in site.config.collections.values() {
                    @let current = current_route == Some(collection.route.as_str());
                    a class=[current.then_some("current")] href={ (route_base(&collection.route)) "/" } {
                        (collection.title)
                    }
                }
            }
        }
    }
}

fn format_date(date: DateTime<Utc>) -> String {
    date.format("%B %-d, %Y").to_string()
}

fn date_line(item: &ContentItem) -> Markup {
    html! {
        @if let Some(date) = item.published_at() {
            time datetime=(date.format("%Y-%m-%d").to_string()) { (format_date(date)) }
        }
    }
}

fn item_list(route: &str, items: &[&ContentItem]) -> Markup {
    html! {
        ul.item-list {
            @for item in items {
                li {
                    a href=(item_url(route, &item.slug)) { (item.metadata.title) }
                    " "
                    (date_line(item))
                    @if let Some(summary) = &item.metadata.summary {
                        p.summary { (summary) }
                    }
                }
            }
        }
    }
}

/// Renders adapted nodes as HTML
pub fn render_nodes(nodes: &[Node]) -> Markup {
    html! {
        @for node in nodes {
            (render_node(node))
        }
    }
}

fn render_node(node: &Node) -> Markup {
    match node {
        Node::Heading { level, id, children } => {
            let inner = render_nodes(children);
            match level {
                1 => html! { h1 id=(id) { (inner) } },
                2 => html! { h2 id=(id) { (inner) } },
                3 => html! { h3 id=(id) { (inner) } },
                4 => html! { h4 id=(id) { (inner) } },
                5 => html! { h5 id=(id) { (inner) } },
                _ => html! { h6 id=(id) { (inner) } },
            }
        }
        Node::Paragraph { children } => html! { p { (render_nodes(children)) } },
        Node::Text { value } => html! { (value) },
        Node::Emphasis { children } => html! { em { (render_nodes(children)) } },
        Node::Strong { children } => html! { strong { (render_nodes(children)) } },
        Node::Strikethrough { children } => html! { del { (render_nodes(children)) } },
        Node::InlineCode { value } => html! { code { (value) } },
        Node::Link { href, title, children } => html! {
            a href=(href) title=[title.as_deref()] { (render_nodes(children)) }
        },
        Node::Image { src, alt, title } => html! {
            img src=(src) alt=(alt) title=[title.as_deref()] loading="lazy";
        },
        Node::CodeBlock { language, code } => html! {
            pre { code class={ "language-" (language) } { (code) } }
        },
        Node::Table { columns, rows } => html! {
            table {
                thead {
                    tr {
                        @for column in columns {
                            th { (column.label) }
                        }
                    }
                }
                tbody {
                    @for row in rows {
                        tr {
                            @for column in columns {
                                td { (row.get(&column.key).map(String::as_str).unwrap_or_default()) }
                            }
                        }
                    }
                }
            }
        },
        Node::List { ordered: true, start, items } => html! {
            ol start=[start.filter(|s| *s != 1)] { (render_nodes(items)) }
        },
        Node::List { items, .. } => html! { ul { (render_nodes(items)) } },
        Node::ListItem { checked, children } => html! {
            li {
                @if let Some(done) = checked {
                    input type="checkbox" disabled checked[*done];
                    " "
                }
                (render_nodes(children))
            }
        },
        Node::BlockQuote { children } => html! { blockquote { (render_nodes(children)) } },
        Node::Callout { kind, title, children } => html! {
            aside class={ "callout callout-" (kind) } role="note" {
                @if let Some(title) = title {
                    p.callout-title { (title) }
                }
                (render_nodes(children))
            }
        },
        Node::Embed { provider, id, title } if provider == "youtube" => html! {
            div.embed {
                iframe
                    src={ "https://www.youtube-nocookie.com/embed/" (id) }
                    title=(title.as_deref().unwrap_or("YouTube video"))
                    loading="lazy"
                    allowfullscreen {}
            }
        },
        Node::Embed { provider, id, .. } => html! { span.embed-unsupported { (provider) ": " (id) } },
        Node::Figure { src, alt, caption } => html! {
            figure {
                img src=(src) alt=(alt) loading="lazy";
                @if let Some(caption) = caption {
                    figcaption { (caption) }
                }
            }
        },
        Node::Html { value } => html! { (PreEscaped(value)) },
        Node::Rule => html! { hr; },
        Node::LineBreak => html! { br; },
        Node::Container { children } => render_nodes(children),
    }
}

fn render_toc(entries: &[TocEntry]) -> Markup {
    html! {
        nav.toc aria-label="Contents" {
            p { strong { "Contents" } }
            ul {
                @for entry in entries {
                    li class={ "level-" (entry.level) } {
                        a href={ "#" (entry.id) } { (entry.text) }
                    }
                }
            }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

fn render_home(site: &Site<'_>, latest: &[(&CollectionConfig, Vec<ContentItem>)]) -> Markup {
    let content = html! {
        (site_header(site, Some("/")))
        main.home {
            h1 { (site.config.site.title) }
            @for (collection, items) in latest {
                section {
                    h2 {
                        a href={ (route_base(&collection.route)) "/" } { (collection.title) }
                    }
                    (item_list(&collection.route, &items.iter().collect::<Vec<_>>()))
                }
            }
        }
    };
    base_document(&site.config.site.title, None, None, content)
}

fn render_collection_index(site: &Site<'_>, collection: &CollectionConfig, live: &[ContentItem]) -> Markup {
    let tags = index::tag_counts(live);
    let content = html! {
        (site_header(site, Some(&collection.route)))
        main.collection-page {
            h1 { (collection.title) }
            @if !tags.is_empty() {
                nav.tags aria-label="Tags" {
                    @for (tag, count) in &tags {
                        a href=(tag_url(&collection.route, tag)) { (tag) " (" (count) ")" }
                    }
                }
            }
            (item_list(&collection.route, &live.iter().collect::<Vec<_>>()))
        }
    };
    base_document(&format!("{} · {}", collection.title, site.config.site.title), None, None, content)
}

fn render_term_page(
    site: &Site<'_>,
    collection: &CollectionConfig,
    kind: &str,
    label: &str,
    items: &[&ContentItem],
) -> Markup {
    let content = html! {
        (site_header(site, Some(&collection.route)))
        main.term-page {
            p.meta {
                a href={ (route_base(&collection.route)) "/" } { (collection.title) }
                " › " (kind)
            }
            h1 { (label) }
            (item_list(&collection.route, items))
        }
    };
    base_document(&format!("{label} · {}", collection.title), None, None, content)
}

fn render_item_page(
    site: &Site<'_>,
    collection: &CollectionConfig,
    item: &ContentItem,
    related: &[&ContentItem],
) -> Markup {
    let meta = &item.metadata;
    let nodes = adapter::adapt(&item.body, &site.ctx);
    let toc = if meta.toc { adapter::table_of_contents(&nodes) } else { Vec::new() };
    let cover = meta.image.as_deref().map(|src| site.ctx.rewrite_media_url(src));
    let minutes = adapter::reading_time(&item.body);

    let content = html! {
        (site_header(site, Some(&collection.route)))
        main {
            article.item lang=[meta.language.as_deref()] {
                header {
                    h1 { (meta.title) }
                    p.meta {
                        (date_line(item))
                        @if let Some(updated) = item.updated_at() {
                            " · Updated " (format_date(updated))
                        }
                        " · " (minutes) " min read"
                    }
                    @if let Some(cover) = &cover {
                        img.cover src=(cover) alt="";
                    }
                    @if let Some(link) = &meta.link {
                        p { a href=(link) rel="noopener" { "Visit project" } }
                    }
                }
                @if !toc.is_empty() {
                    (render_toc(&toc))
                }
                div.content {
                    (render_nodes(&nodes))
                }
                @if !meta.team.is_empty() {
                    section.team {
                        h2 { "Team" }
                        ul {
                            @for member in &meta.team {
                                li {
                                    @if let Some(url) = &member.url {
                                        a href=(url) { (member.name) }
                                    } @else {
                                        (member.name)
                                    }
                                }
                            }
                        }
                    }
                }
                @if !meta.faq.is_empty() {
                    section.faq {
                        h2 { "FAQ" }
                        dl {
                            @for entry in &meta.faq {
                                dt { (entry.question) }
                                dd { (entry.answer) }
                            }
                        }
                    }
                }
                @if !meta.references.is_empty() {
                    section.references {
                        h2 { "References" }
                        ol {
                            @for reference in &meta.references {
                                li {
                                    a href=(reference.url) rel="noopener" {
                                        (reference.title)
                                    }
                                }
                            }
                        }
                    }
                }
                @if !meta.tags.is_empty() || !meta.categories.is_empty() {
                    footer.tags {
                        @for category in &meta.categories {
                            a.category href=(category_url(&collection.route, category)) { (category) }
                        }
                        @for tag in &meta.tags {
                            a href=(tag_url(&collection.route, tag)) { "#" (tag) }
                        }
                    }
                }
                @if !related.is_empty() {
                    section.related {
                        h2 { "Related" }
                        (item_list(&collection.route, related))
                    }
                }
            }
        }
    };

    base_document(
        &format!("{} · {}", meta.title, site.config.site.title),
        meta.summary.as_deref(),
        meta.canonical.as_deref(),
        content,
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::test_helpers::{ItemBuilder, write_file};
    use crate::types::{FaqEntry, Reference};
    use tempfile::TempDir;

    fn site(config: &SiteConfig) -> Site<'_> {
        Site {
            config,
            ctx: AdapterContext::new("https://example.com"),
        }
    }

    fn blog() -> CollectionConfig {
        SiteConfig::default().collection("blog").unwrap().clone()
    }

    fn render(markdown: &str) -> String {
        let ctx = AdapterContext::new("https://example.com");
        render_nodes(&adapter::adapt(markdown, &ctx)).into_string()
    }

    #[test]
    fn urls_for_routes() {
        assert_eq!(item_url("/blog", "hello"), "/blog/hello/");
        assert_eq!(item_url("/", "hello"), "/hello/");
        assert_eq!(tag_url("/blog", "Política & Sociedade"), "/blog/tag/politica-and-sociedade/");
        assert_eq!(category_url("/work/", "Case Studies"), "/work/category/case-studies/");
        assert_eq!(route_dir(Path::new("dist"), "/a/b/"), Path::new("dist/a/b"));
    }

    #[test]
    fn heading_renders_with_anchor() {
        assert_eq!(render("## Hello World\n"), r#"<h2 id="hello-world">Hello World</h2>"#);
    }

    #[test]
    fn text_is_escaped_but_raw_html_is_not() {
        let html = render("a < b\n\n<div class=\"raw\">x</div>\n");
        assert!(html.contains("a &lt; b"));
        assert!(html.contains(r#"<div class="raw">x</div>"#));
    }

    #[test]
    fn code_block_carries_language_class() {
        let html = render("```rust\nlet x = 1 < 2;\n```\n");
        assert!(html.contains(r#"<pre><code class="language-rust">let x = 1 &lt; 2;"#));
    }

    #[test]
    fn table_renders_from_records() {
        let html = render("| Nome | Preço |\n|---|---|\n| Item A | R$10 |\n");
        assert!(html.contains("<th>Nome</th><th>Preço</th>"));
        assert!(html.contains("<td>Item A</td><td>R$10</td>"));
    }

    #[test]
    fn callout_and_embed_render() {
        let html = render("<Callout type=\"tip\">\n\nTry it.\n\n</Callout>\n\n<YouTube id=\"abc\" />\n");
        assert!(html.contains(r#"<aside class="callout callout-tip" role="note">"#));
        assert!(html.contains("https://www.youtube-nocookie.com/embed/abc"));
    }

    #[test]
    fn task_list_checkboxes() {
        let html = render("- [x] done\n");
        assert!(html.contains(r#"<input type="checkbox" disabled checked>"#));
    }

    #[test]
    fn ordered_list_start_only_when_not_one() {
        assert!(render("1. a\n").contains("<ol>"));
        assert!(render("4. a\n").contains(r#"<ol start="4">"#));
    }

    #[test]
    fn item_page_sections() {
        let config = SiteConfig::default();
        let site = site(&config);
        let mut item = ItemBuilder::new("post")
            .title("My <Post>")
            .date("2024-03-05")
            .tags(&["rust"])
            .categories(&["Engineering"])
            .body("## Intro\n\nText.\n")
            .build();
        item.metadata.toc = true;
        item.metadata.image = Some("https://example.com/img/cover.jpg".into());
        item.metadata.faq = vec![FaqEntry {
            question: "Why?".into(),
            answer: "Because.".into(),
        }];
        item.metadata.references = vec![Reference {
            title: "https://ref.example.org".into(),
            url: "https://ref.example.org".into(),
        }];
        let other = ItemBuilder::new("other").title("Other").build();

        let html = render_item_page(&site, &blog(), &item, &[&other]).into_string();
        assert!(html.contains("<h1>My &lt;Post&gt;</h1>"));
        assert!(html.contains(r#"<time datetime="2024-03-05">March 5, 2024</time>"#));
        assert!(html.contains(r##"<a href="#intro">Intro</a>"##));
        assert!(html.contains(r#"src="/img/cover.jpg""#));
        assert!(html.contains("<dt>Why?</dt>"));
        assert!(html.contains(">https://ref.example.org</a>"));
        assert!(html.contains(r#"href="/blog/tag/rust/""#));
        assert!(html.contains(r#"href="/blog/category/engineering/""#));
        assert!(html.contains(r#"href="/blog/other/""#));
    }

    #[test]
    fn toc_only_when_requested() {
        let config = SiteConfig::default();
        let item = ItemBuilder::new("post").body("## Intro\n").build();
        let html = render_item_page(&site(&config), &blog(), &item, &[]).into_string();
        assert!(!html.contains("Contents"));
    }

    #[test]
    fn tags_sharing_a_slug_share_a_page() {
        let groups = group_by_anchor(vec!["Rust".into(), "rust".into(), "&".into(), "Go".into()]);
        assert_eq!(groups["rust"], vec!["Rust", "rust"]);
        assert_eq!(groups["and"], vec!["&"]);
        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn generate_writes_pages_and_skips_drafts() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_file(
            src.path(),
            "blog/first.md",
            "---\ntitle: First\ndate: 2024-01-01\ntags: [rust]\ncategories: [Engineering]\n---\nHello\n",
        );
        write_file(
            src.path(),
            "blog/second.mdx",
            "---\ntitle: Second\ndate: 2024-02-01\ntags: [rust, web]\n---\nWorld\n",
        );
        write_file(
            src.path(),
            "blog/hidden.md",
            "---\ntitle: Hidden\nstatus: draft\ntags: [secret]\n---\nWIP\n",
        );

        let config = SiteConfig::default();
        let repo = ContentRepository::new(src.path(), &CacheConfig::default());
        let summary = generate(&config, &repo, out.path()).unwrap();

        let blog = &summary.collections[0];
        assert_eq!(blog.name, "blog");
        assert_eq!((blog.items, blog.drafts, blog.tag_pages, blog.category_pages), (2, 1, 2, 1));

        let out = out.path();
        assert!(out.join("index.html").exists());
        assert!(out.join("blog/first/index.html").exists());
        assert!(out.join("blog/second/index.html").exists());
        assert!(!out.join("blog/hidden").exists());
        assert!(!out.join("blog/tag/secret").exists());
        assert!(out.join("blog/category/engineering/index.html").exists());

        let listing = fs::read_to_string(out.join("blog/index.html")).unwrap();
        let second = listing.find("Second").unwrap();
        let first = listing.find("First").unwrap();
        assert!(second < first, "newest item should be listed first");

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("blog/index.json")).unwrap()).unwrap();
        assert_eq!(json[0]["slug"], "second");
        assert_eq!(json[0]["url"], "/blog/second/");

        let first_page = fs::read_to_string(out.join("blog/first/index.html")).unwrap();
        assert!(first_page.contains(r#"href="/blog/second/""#), "related item linked");

        // empty work collection still gets an index
        assert!(out.join("work/index.html").exists());
        assert_eq!(summary.collections[1].items, 0);
    }

    #[test]
    fn generate_refuses_colliding_routes() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_file(src.path(), "blog/first.md", "---\ntitle: First\n---\nHello\n");

        let mut config = SiteConfig::default();
        config.collections.get_mut("blog").unwrap().route = "/".into();
        let repo = ContentRepository::new(src.path(), &CacheConfig::default());
        let err = generate(&config, &repo, out.path()).unwrap_err();
        assert!(matches!(err, GenerateError::Config(_)));
        assert!(!out.path().join("index.html").exists());
    }
}
