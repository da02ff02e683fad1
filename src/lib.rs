//! # folio
//!
//! The content pipeline behind a personal portfolio site: a blog, a work
//! showcase, and the access gate that keeps a few pages behind a shared
//! secret. Content is plain Markdown/MDX files on disk; there is no
//! database.
//!
//! # Pipeline
//!
//! ```text
//! 1. Scan      content/<collection>/*.md(x)  →  Vec<ContentItem>   (frontmatter + body)
//! 2. Index     items  →  tags, categories, related items
//! 3. Adapt     body   →  Vec<Node>                                 (presentational tree)
//! 4. Generate  nodes  →  dist/                                      (static HTML)
//!
//!    Gate      request path  →  not found | open | locked | unlocked
//! ```
//!
//! Scanning never fails: an unreadable file or malformed frontmatter skips
//! that one file with a warning. Everything downstream of the scan is a pure
//! function of the scanned items.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`frontmatter`] | Splits a file into YAML/TOML header and body; resolves field aliases |
//! | [`scan`] | Lists a content directory, parses files in parallel, sorts newest first |
//! | [`repository`] | Scans behind an explicit caching policy (none, TTL, invalidate-on-write) |
//! | [`index`] | Tag/category listing and filtering, weighted related-content scoring |
//! | [`adapter`] | Markdown/MDX body → node tree: anchors, tables as records, shortcodes |
//! | [`gate`] | Per-navigation route access state machine with stale-result discarding |
//! | [`session`] | Shared-secret verification, session tokens and cookies, admin roles |
//! | [`store`] | Revisioned content writes for the admin editor |
//! | [`generate`] | Static HTML rendering with Maud |
//! | [`config`] | `config.toml` loading, stock defaults, validation |
//! | [`types`] | `ContentItem` and `Metadata` |
//! | [`naming`] | Slugs, anchor ids and table column keys |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Explicit Fallbacks
//!
//! Two behaviours that are easy to get wrong silently are configuration, not
//! accidents: a path no route rule mentions follows
//! [`config::DefaultPolicy`] (`permit-by-default` unless configured
//! otherwise), and whether scans are re-read on every request follows
//! [`config::CachePolicy`] (`none` unless configured otherwise).
//!
//! ## Never Fail a Render
//!
//! The adapter maps anything it has no dedicated node for, including
//! unregistered shortcodes, to a generic container of its children. Content
//! authors see their text even when a construct is unsupported.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/): malformed
//! templates are build errors and all interpolation is escaped. The only raw
//! output is HTML the content author wrote into the body themselves.

pub mod adapter;
pub mod config;
pub mod frontmatter;
pub mod gate;
pub mod generate;
pub mod index;
pub mod naming;
pub mod output;
pub mod repository;
pub mod scan;
pub mod session;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
