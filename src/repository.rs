//! Content repository: directory scans behind an explicit caching policy.
//!
//! The reference behavior re-reads a content directory on every request,
//! which is what [`CachePolicy::None`] does. The other two policies keep the
//! last scan of each directory:
//!
//! - [`CachePolicy::Ttl`] reuses a scan until it is older than the configured
//!   time-to-live.
//! - [`CachePolicy::InvalidateOnWrite`] reuses a scan until
//!   [`ContentRepository::invalidate`] is called, which the content editor
//!   does after every successful write.
//!
//! Scans are shared as `Arc<Vec<ContentItem>>`, so a cached collection is
//! never copied per request and never mutated after it is built.

use crate::config::{CacheConfig, CachePolicy};
use crate::scan;
use crate::types::ContentItem;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

struct CachedScan {
    items: Arc<Vec<ContentItem>>,
    loaded_at: Instant,
}

/// Hit/miss counters, reported by the CLI after a build.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cached, {} scanned", self.hits, self.misses)
    }
}

pub struct ContentRepository {
    root: PathBuf,
    policy: CachePolicy,
    ttl: Duration,
    entries: Mutex<HashMap<PathBuf, CachedScan>>,
    stats: Mutex<CacheStats>,
}

impl ContentRepository {
    pub fn new(root: impl Into<PathBuf>, cache: &CacheConfig) -> Self {
        Self {
            root: root.into(),
            policy: cache.policy,
            ttl: Duration::from_secs(cache.ttl_seconds),
            entries: Mutex::new(HashMap::new()),
            stats: Mutex::new(CacheStats::default()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Items of the collection at `segments`, newest first.
    pub fn items<S: AsRef<str>>(&self, segments: &[S]) -> Arc<Vec<ContentItem>> {
        self.items_at(segments, Instant::now())
    }

    fn items_at<S: AsRef<str>>(&self, segments: &[S], now: Instant) -> Arc<Vec<ContentItem>> {
        let dir = scan::collection_dir(&self.root, segments);

        if self.policy != CachePolicy::None {
            if let Some(cached) = self.entries.lock().get(&dir) {
                let fresh = match self.policy {
                    CachePolicy::Ttl => now.saturating_duration_since(cached.loaded_at) < self.ttl,
                    _ => true,
                };
                if fresh {
                    self.stats.lock().hits += 1;
                    debug!(dir = %dir.display(), "content cache hit");
                    return Arc::clone(&cached.items);
                }
            }
        }

        let items = Arc::new(scan::scan_dir(&self.root, &dir));
        self.stats.lock().misses += 1;

        if self.policy != CachePolicy::None {
            self.entries.lock().insert(
                dir,
                CachedScan {
                    items: Arc::clone(&items),
                    loaded_at: now,
                },
            );
        }
        items
    }

    /// Item by slug within a collection.
    pub fn find<S: AsRef<str>>(&self, segments: &[S], slug: &str) -> Option<ContentItem> {
        self.items(segments).iter().find(|i| i.slug == slug).cloned()
    }

    /// Drop the cached scan of one collection.
    pub fn invalidate<S: AsRef<str>>(&self, segments: &[S]) {
        let dir = scan::collection_dir(&self.root, segments);
        if self.entries.lock().remove(&dir).is_some() {
            debug!(dir = %dir.display(), "content cache invalidated");
        }
    }

    pub fn invalidate_all(&self) {
        self.entries.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        *self.stats.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{slugs, write_file};
    use tempfile::TempDir;

    fn repo(root: &Path, policy: CachePolicy) -> ContentRepository {
        ContentRepository::new(
            root,
            &CacheConfig {
                policy,
                ttl_seconds: 30,
            },
        )
    }

    #[test]
    fn no_cache_rereads_every_time() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "blog/a.md", "# A");
        let repo = repo(tmp.path(), CachePolicy::None);

        assert_eq!(slugs(&repo.items(&["blog"])), vec!["a"]);
        write_file(tmp.path(), "blog/b.md", "# B");
        assert_eq!(slugs(&repo.items(&["blog"])), vec!["a", "b"]);
        assert_eq!(repo.stats(), CacheStats { hits: 0, misses: 2 });
    }

    #[test]
    fn invalidate_on_write_holds_until_invalidated() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "blog/a.md", "# A");
        let repo = repo(tmp.path(), CachePolicy::InvalidateOnWrite);

        assert_eq!(repo.items(&["blog"]).len(), 1);
        write_file(tmp.path(), "blog/b.md", "# B");
        assert_eq!(repo.items(&["blog"]).len(), 1);

        repo.invalidate(&["blog"]);
        assert_eq!(repo.items(&["blog"]).len(), 2);
        assert_eq!(repo.stats(), CacheStats { hits: 1, misses: 2 });
    }

    #[test]
    fn ttl_expires() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "blog/a.md", "# A");
        let repo = repo(tmp.path(), CachePolicy::Ttl);
        let start = Instant::now();

        assert_eq!(repo.items_at(&["blog"], start).len(), 1);
        write_file(tmp.path(), "blog/b.md", "# B");
        assert_eq!(repo.items_at(&["blog"], start + Duration::from_secs(10)).len(), 1);
        assert_eq!(repo.items_at(&["blog"], start + Duration::from_secs(31)).len(), 2);
    }

    #[test]
    fn collections_are_cached_independently() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "blog/a.md", "# A");
        write_file(tmp.path(), "work/w.md", "# W");
        let repo = repo(tmp.path(), CachePolicy::InvalidateOnWrite);

        assert_eq!(slugs(&repo.items(&["blog"])), vec!["a"]);
        assert_eq!(slugs(&repo.items(&["work"])), vec!["w"]);
        repo.invalidate(&["blog"]);
        repo.items(&["work"]);
        assert_eq!(repo.stats().hits, 1);
    }

    #[test]
    fn find_by_slug() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "blog/hello.md", "---\ntitle: Hello\n---\n");
        let repo = repo(tmp.path(), CachePolicy::None);

        assert_eq!(repo.find(&["blog"], "hello").unwrap().metadata.title, "Hello");
        assert!(repo.find(&["blog"], "missing").is_none());
    }

    #[test]
    fn missing_collection_is_empty_and_not_an_error() {
        let tmp = TempDir::new().unwrap();
        let repo = repo(tmp.path(), CachePolicy::Ttl);
        assert!(repo.items(&["nowhere"]).is_empty());
    }
}
