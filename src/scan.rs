//! Content directory scanning.
//!
//! Lists a content directory, parses every eligible file and returns the
//! items newest first. A scan never fails: a missing or unreadable directory
//! is an empty collection, and a file that cannot be read or whose
//! frontmatter is malformed is skipped with a warning while the rest of the
//! directory loads.
//!
//! ## Directory Structure
//!
//! ```text
//! content/                      # Source root
//! ├── config.toml               # Site configuration (optional)
//! ├── blog/                     # A collection, dir = ["blog"]
//! │   ├── hello-world.mdx       # slug "hello-world"
//! │   ├── design-tokens.md      # slug "design-tokens"
//! │   ├── notes.txt             # ignored: not a content extension
//! │   └── .draft.md             # ignored: hidden
//! └── work/
//!     └── case-study.mdx
//! ```
//!
//! ## Ordering
//!
//! Items sort by publication date, newest first. Items without a date (or
//! with one that does not parse) sort after every dated item, including
//! dates before 1970. Equal dates keep filename order.

use crate::adapter::{self, AdapterContext};
use crate::frontmatter;
use crate::naming;
use crate::types::ContentItem;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// File extensions recognized as content documents (compared case-insensitively).
pub const CONTENT_EXTENSIONS: &[&str] = &["md", "mdx"];

/// Resolve path segments against the source root.
pub fn collection_dir<S: AsRef<str>>(root: &Path, segments: &[S]) -> PathBuf {
    segments
        .iter()
        .fold(root.to_path_buf(), |dir, segment| dir.join(segment.as_ref()))
}

/// Scan the directory named by `segments` under `root`.
pub fn scan<S: AsRef<str>>(root: &Path, segments: &[S]) -> Vec<ContentItem> {
    scan_dir(root, &collection_dir(root, segments))
}

/// Scan `dir`, recording sources relative to `root`.
pub fn scan_dir(root: &Path, dir: &Path) -> Vec<ContentItem> {
    let files = content_files(dir);

    let parsed: Vec<Option<ContentItem>> = files
        .par_iter()
        .map(|path| load_item(root, path))
        .collect();

    let mut seen = HashSet::new();
    let mut items: Vec<ContentItem> = parsed
        .into_iter()
        .flatten()
        .filter(|item| {
            let fresh = seen.insert(item.slug.clone());
            if !fresh {
                warn!(slug = %item.slug, source = %item.source, "duplicate slug, skipping");
            }
            fresh
        })
        .collect();

    sort_by_date(&mut items);
    debug!(dir = %dir.display(), items = items.len(), "scanned content directory");
    items
}

/// Eligible files against items loaded, for `folio check`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub files: usize,
    pub items: usize,
}

impl ScanReport {
    /// Files dropped for unreadable content, malformed frontmatter or a
    /// duplicate slug.
    pub fn skipped(&self) -> usize {
        self.files.saturating_sub(self.items)
    }
}

pub fn report<S: AsRef<str>>(root: &Path, segments: &[S]) -> ScanReport {
    let dir = collection_dir(root, segments);
    ScanReport {
        files: content_files(&dir).len(),
        items: scan_dir(root, &dir).len(),
    }
}

/// Stable newest-first sort; undated items sort last.
pub fn sort_by_date(items: &mut [ContentItem]) {
    items.sort_by_key(|item| std::cmp::Reverse(item.sort_key()));
}

/// Eligible files directly inside `dir`, in filename order.
fn content_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_content_file(path))
        .collect()
}

/// Whether `path` names a visible file with a content extension.
pub fn is_content_file(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .map(|n| n.to_string_lossy().starts_with('.'))
        .unwrap_or(true);
    if hidden {
        return false;
    }
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| CONTENT_EXTENSIONS.contains(&ext.as_str()))
}

/// Read and parse one file; `None` skips it.
fn load_item(root: &Path, path: &Path) -> Option<ContentItem> {
    let source = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/");

    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!(%source, error = %e, "unreadable content file, skipping");
            return None;
        }
    };

    let Some(parsed) = frontmatter::parse(&text) else {
        warn!(%source, "malformed frontmatter, skipping");
        return None;
    };

    let slug = naming::item_slug(path)?;
    let mut metadata = parsed.metadata;
    if metadata.title.is_empty() {
        metadata.title = first_heading(&parsed.body).unwrap_or_else(|| naming::display_title(&slug));
    }

    Some(ContentItem {
        slug,
        source,
        metadata,
        body: parsed.body,
    })
}

/// Text of the first level-1 heading in a body. Lines inside code blocks
/// are not headings.
fn first_heading(body: &str) -> Option<String> {
    let nodes = adapter::adapt(body, &AdapterContext::new(""));
    adapter::table_of_contents(&nodes)
        .into_iter()
        .find(|entry| entry.level == 1)
        .map(|entry| entry.text.trim().to_string())
        .filter(|title| !title.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{slugs, write_file};
    use tempfile::TempDir;

    #[test]
    fn missing_directory_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(scan(tmp.path(), &["does", "not", "exist"]).is_empty());
    }

    #[test]
    fn directory_path_that_is_a_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "blog", "not a directory");
        assert!(scan(tmp.path(), &["blog"]).is_empty());
    }

    #[test]
    fn empty_directory_is_empty() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("blog")).unwrap();
        assert!(scan(tmp.path(), &["blog"]).is_empty());
    }

    #[test]
    fn only_content_extensions_are_scanned() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "blog/a.md", "---\ntitle: A\n---\n");
        write_file(tmp.path(), "blog/b.MDX", "---\ntitle: B\n---\n");
        write_file(tmp.path(), "blog/c.txt", "---\ntitle: C\n---\n");
        write_file(tmp.path(), "blog/d.markdown.bak", "---\ntitle: D\n---\n");
        write_file(tmp.path(), "blog/.hidden.md", "---\ntitle: H\n---\n");

        let items = scan(tmp.path(), &["blog"]);
        assert_eq!(slugs(&items), vec!["a", "b"]);
    }

    #[test]
    fn subdirectories_are_not_descended() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "blog/top.md", "# Top");
        write_file(tmp.path(), "blog/nested/deep.md", "# Deep");
        assert_eq!(slugs(&scan(tmp.path(), &["blog"])), vec!["top"]);
    }

    #[test]
    fn dated_items_sort_before_undated() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "blog/a-undated.md", "---\ntitle: Undated\n---\n");
        write_file(tmp.path(), "blog/b-dated.md", "---\ntitle: Dated\npublishedAt: 2024-01-01\n---\n");

        let items = scan(tmp.path(), &["blog"]);
        assert_eq!(slugs(&items), vec!["b-dated", "a-undated"]);
    }

    #[test]
    fn pre_epoch_date_sorts_before_undated() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "blog/a-undated.md", "---\ntitle: Undated\n---\n");
        write_file(tmp.path(), "blog/b-old.md", "---\ntitle: Landing\ndate: 1969-07-20\n---\n");

        let items = scan(tmp.path(), &["blog"]);
        assert_eq!(slugs(&items), vec!["b-old", "a-undated"]);
    }

    #[test]
    fn newest_first_with_stable_ties() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "blog/old.md", "---\ndate: 2020-05-01\n---\n");
        write_file(tmp.path(), "blog/new.md", "---\ndate: 2024-05-01\n---\n");
        write_file(tmp.path(), "blog/tie-a.md", "---\ndate: 2022-01-01\n---\n");
        write_file(tmp.path(), "blog/tie-b.md", "---\ndate: 2022-01-01\n---\n");
        write_file(tmp.path(), "blog/bad-date.md", "---\ndate: someday\n---\n");

        let items = scan(tmp.path(), &["blog"]);
        assert_eq!(slugs(&items), vec!["new", "tie-a", "tie-b", "old", "bad-date"]);
    }

    #[test]
    fn malformed_file_is_skipped_rest_survives() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "blog/good.md", "---\ntitle: Good\n---\nBody");
        write_file(tmp.path(), "blog/broken.md", "---\ntitle: [oops\n---\nBody");
        write_file(tmp.path(), "blog/unclosed.md", "---\ntitle: never closed\n");

        let items = scan(tmp.path(), &["blog"]);
        assert_eq!(slugs(&items), vec!["good"]);
    }

    #[test]
    fn non_utf8_file_is_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("blog")).unwrap();
        fs::write(tmp.path().join("blog/binary.md"), [0xff, 0xfe, 0x00, 0x80]).unwrap();
        write_file(tmp.path(), "blog/text.md", "# Text");

        assert_eq!(slugs(&scan(tmp.path(), &["blog"])), vec!["text"]);
    }

    #[test]
    fn duplicate_stem_keeps_first_in_filename_order() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "blog/post.md", "---\ntitle: From md\n---\n");
        write_file(tmp.path(), "blog/post.mdx", "---\ntitle: From mdx\n---\n");

        let items = scan(tmp.path(), &["blog"]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].metadata.title, "From md");
    }

    #[test]
    fn title_falls_back_to_heading_then_slug() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "blog/with-heading.md", "Intro\n\n# The Heading\n");
        write_file(tmp.path(), "blog/bare-file.md", "No heading here.");

        let items = scan(tmp.path(), &["blog"]);
        let heading = items.iter().find(|i| i.slug == "with-heading").unwrap();
        let bare = items.iter().find(|i| i.slug == "bare-file").unwrap();
        assert_eq!(heading.metadata.title, "The Heading");
        assert_eq!(bare.metadata.title, "bare file");
    }

    #[test]
    fn title_fallback_ignores_code_blocks() {
        let tmp = TempDir::new().unwrap();
        write_file(
            tmp.path(),
            "blog/setup.md",
            "```sh\n# install deps\nnpm ci\n```\n\n## Steps\n\n# Setting Up\n",
        );

        let items = scan(tmp.path(), &["blog"]);
        assert_eq!(items[0].metadata.title, "Setting Up");
    }

    #[test]
    fn source_is_relative_to_root() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "src/posts/entry.mdx", "# Entry");

        let items = scan(tmp.path(), &["src", "posts"]);
        assert_eq!(items[0].source, "src/posts/entry.mdx");
        assert_eq!(items[0].slug, "entry");
    }

    #[test]
    fn report_counts_skipped_files() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "blog/good.md", "# Good");
        write_file(tmp.path(), "blog/bad.md", "---\ntitle: [\n---\n");
        write_file(tmp.path(), "blog/good.mdx", "# Duplicate");
        write_file(tmp.path(), "blog/notes.txt", "ignored");

        let counts = report(tmp.path(), &["blog"]);
        assert_eq!(counts, ScanReport { files: 3, items: 1 });
        assert_eq!(counts.skipped(), 2);
    }

    #[test]
    fn scanning_is_read_only_and_repeatable() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "blog/a.md", "---\ntitle: A\ndate: 2024-01-02\n---\nBody");
        let first = scan(tmp.path(), &["blog"]);
        let second = scan(tmp.path(), &["blog"]);
        assert_eq!(first, second);
    }
}
