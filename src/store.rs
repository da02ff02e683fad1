//! Content persistence for the admin editor.
//!
//! [`ContentStore`] is the write seam: files keyed by a `/`-separated path
//! relative to the content root, each version identified by a [`Revision`]
//! (SHA-256 of its bytes). Writes name the revision they expect to replace,
//! so two editors racing on one file get a [`StoreError::Conflict`] instead
//! of silently clobbering each other. [`FsContentStore`] is the local
//! implementation; a remote hosting backend would implement the same trait.
//!
//! [`ContentEditor`] sits on top: it validates an item, serializes it back to
//! frontmatter + body, stores it at `<collection dir>/<slug>.mdx` and drops
//! the repository's cached scan of that collection.

use crate::config::CollectionConfig;
use crate::frontmatter;
use crate::repository::ContentRepository;
use crate::types::Metadata;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("slug is empty")]
    EmptySlug,
    #[error("slug {0:?} must be a plain file name")]
    InvalidSlug(String),
    #[error("title is empty")]
    EmptyTitle,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{path} changed since it was read (expected {expected}, found {found})")]
    Conflict {
        path: String,
        expected: String,
        found: String,
    },
    #[error("invalid content: {0}")]
    Invalid(#[from] ValidationError),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("path escapes the content root: {0}")]
    InvalidPath(String),
}

/// Content hash identifying one version of a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision(String);

impl Revision {
    pub fn of(content: &str) -> Self {
        Revision(hex::encode(Sha256::digest(content.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0[..12.min(self.0.len())])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub path: String,
    pub content: String,
    pub revision: Revision,
}

pub trait ContentStore {
    fn read(&self, path: &str) -> Result<StoredFile, StoreError>;

    /// Write `content` at `path`. `expected` is the revision being replaced,
    /// `None` to create. Re-putting identical content is a no-op success.
    fn put(&self, path: &str, content: &str, expected: Option<&Revision>) -> Result<Revision, StoreError>;

    fn delete(&self, path: &str, expected: &Revision) -> Result<(), StoreError>;
}

/// Files under a local directory.
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StoreError> {
        let rel = Path::new(path);
        let plain = !path.is_empty() && rel.components().all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(rel))
    }

    fn current(&self, path: &str) -> Result<Option<Revision>, StoreError> {
        match self.read(path) {
            Ok(file) => Ok(Some(file.revision)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn conflict(path: &str, expected: Option<&Revision>, found: Option<&Revision>) -> StoreError {
    let show = |r: Option<&Revision>| r.map_or_else(|| "nothing".to_string(), Revision::to_string);
    StoreError::Conflict {
        path: path.to_string(),
        expected: show(expected),
        found: show(found),
    }
}

impl ContentStore for FsContentStore {
    fn read(&self, path: &str) -> Result<StoredFile, StoreError> {
        let full = self.resolve(path)?;
        let content = match fs::read_to_string(&full) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(path.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(StoredFile {
            path: path.to_string(),
            revision: Revision::of(&content),
            content,
        })
    }

    fn put(&self, path: &str, content: &str, expected: Option<&Revision>) -> Result<Revision, StoreError> {
        let full = self.resolve(path)?;
        let revision = Revision::of(content);
        let current = self.current(path)?;

        if current.as_ref() == Some(&revision) {
            return Ok(revision);
        }
        if current.as_ref() != expected {
            return Err(conflict(path, expected, current.as_ref()));
        }

        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full, content)?;
        Ok(revision)
    }

    fn delete(&self, path: &str, expected: &Revision) -> Result<(), StoreError> {
        let full = self.resolve(path)?;
        match self.current(path)? {
            None => Err(StoreError::NotFound(path.to_string())),
            Some(found) if &found != expected => Err(conflict(path, Some(expected), Some(&found))),
            Some(_) => Ok(fs::remove_file(full)?),
        }
    }
}

/// Check an item before it is written.
pub fn validate(slug: &str, metadata: &Metadata) -> Result<(), ValidationError> {
    if slug.trim().is_empty() {
        return Err(ValidationError::EmptySlug);
    }
    if slug.contains(['/', '\\']) || slug.starts_with('.') || slug.trim() != slug {
        return Err(ValidationError::InvalidSlug(slug.to_string()));
    }
    if metadata.title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(())
}

/// Writes items by slug and keeps the repository cache honest.
pub struct ContentEditor<'r, S> {
    store: S,
    repository: &'r ContentRepository,
}

impl<'r, S: ContentStore> ContentEditor<'r, S> {
    pub fn new(store: S, repository: &'r ContentRepository) -> Self {
        Self { store, repository }
    }

    /// Create or overwrite the item `slug` in `collection`. An existing `.md`
    /// file is updated in place; new items are written as `.mdx`.
    pub fn save(
        &self,
        collection: &CollectionConfig,
        slug: &str,
        metadata: &Metadata,
        body: &str,
    ) -> Result<Revision, StoreError> {
        validate(slug, metadata)?;
        let content = frontmatter::serialize(metadata, body)?;

        let (path, current) = match self.existing(collection, slug)? {
            Some(file) => (file.path, Some(file.revision)),
            None => (item_path(collection, slug, "mdx"), None),
        };
        let revision = self.store.put(&path, &content, current.as_ref())?;

        self.repository.invalidate(&collection.dir);
        info!(%path, %revision, "saved content item");
        Ok(revision)
    }

    pub fn remove(&self, collection: &CollectionConfig, slug: &str) -> Result<(), StoreError> {
        let file = self
            .existing(collection, slug)?
            .ok_or_else(|| StoreError::NotFound(item_path(collection, slug, "mdx")))?;
        self.store.delete(&file.path, &file.revision)?;

        self.repository.invalidate(&collection.dir);
        info!(path = %file.path, "removed content item");
        Ok(())
    }

    fn existing(&self, collection: &CollectionConfig, slug: &str) -> Result<Option<StoredFile>, StoreError> {
        for ext in ["md", "mdx"] {
            match self.store.read(&item_path(collection, slug, ext)) {
                Ok(file) => return Ok(Some(file)),
                Err(StoreError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }
}

fn item_path(collection: &CollectionConfig, slug: &str, ext: &str) -> String {
    let mut parts: Vec<&str> = collection.dir.iter().map(String::as_str).collect();
    let file = format!("{slug}.{ext}");
    parts.push(&file);
    parts.join("/")
}
