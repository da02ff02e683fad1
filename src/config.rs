//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden by a sparse user file at the source root; the merged result is
//! deserialized once at startup and passed down as an immutable value.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = "Portfolio"
//! origin = ""                # e.g. "https://example.com"; enables same-origin media rewriting
//!
//! [collections.blog]
//! dir = ["blog"]             # path segments relative to the source root
//! route = "/blog"
//! title = "Blog"
//!
//! [collections.work]
//! dir = ["work"]
//! route = "/work"
//! title = "Work"
//!
//! [routes]
//! default_policy = "permit-by-default"   # or "deny-by-default"
//!
//! [routes.allowed]
//! "/" = true
//! "/blog" = true
//! "/work" = true
//!
//! [routes.protected]
//! # "/work/client-x" = true
//!
//! [related]
//! limit = 3
//! pillar = 5
//! category = 3
//! tag = 2
//! keyword = 1
//!
//! [cache]
//! policy = "none"            # "none" | "ttl" | "invalidate-on-write"
//! ttl_seconds = 60
//!
//! [session]
//! cookie_name = "folio_session"
//! ttl_minutes = 60
//! ```
//!
//! Secrets never live in this file. The access password and the admin
//! allowlist come from the environment and are carried in [`Secrets`].
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML encode error: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Longest session lifetime accepted: one year.
pub const MAX_SESSION_TTL_MINUTES: u64 = 60 * 24 * 365;

/// Largest accepted related-content weight.
pub const MAX_RELATED_WEIGHT: u32 = 1_000;

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site identity and origin.
    pub site: SiteSection,
    /// Content collections keyed by name.
    pub collections: BTreeMap<String, CollectionConfig>,
    /// Route allow-list and protected routes.
    pub routes: RoutesConfig,
    /// Related-content weights and limit.
    pub related: RelatedConfig,
    /// Content repository caching policy.
    pub cache: CacheConfig,
    /// Session cookie settings.
    pub session: SessionConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site: SiteSection::default(),
            collections: default_collections(),
            routes: RoutesConfig::default(),
            related: RelatedConfig::default(),
            cache: CacheConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

fn default_collections() -> BTreeMap<String, CollectionConfig> {
    let mut collections = BTreeMap::new();
    collections.insert(
        "blog".to_string(),
        CollectionConfig {
            dir: vec!["blog".to_string()],
            route: "/blog".to_string(),
            title: "Blog".to_string(),
        },
    );
    collections.insert(
        "work".to_string(),
        CollectionConfig {
            dir: vec!["work".to_string()],
            route: "/work".to_string(),
            title: "Work".to_string(),
        },
    );
    collections
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.site.origin.is_empty() {
            let origin = url::Url::parse(&self.site.origin).map_err(|e| {
                ConfigError::Validation(format!("site.origin is not a URL: {e}"))
            })?;
            if origin.cannot_be_a_base() {
                return Err(ConfigError::Validation(
                    "site.origin must be an absolute http(s) URL".into(),
                ));
            }
        }
        let mut routes = BTreeMap::new();
        for (name, collection) in &self.collections {
            if collection.dir.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "collections.{name}.dir must not be empty"
                )));
            }
            if collection.dir.iter().any(|s| s.is_empty() || s == "..") {
                return Err(ConfigError::Validation(format!(
                    "collections.{name}.dir segments must be non-empty and not '..'"
                )));
            }
            if !collection.route.starts_with('/') {
                return Err(ConfigError::Validation(format!(
                    "collections.{name}.route must start with '/'"
                )));
            }
            let route = collection.route.trim_end_matches('/');
            if route.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "collections.{name}.route must not be '/', the home page is published there"
                )));
            }
            if let Some(other) = routes.insert(route, name) {
                return Err(ConfigError::Validation(format!(
                    "collections.{other} and collections.{name} share the route '{route}'"
                )));
            }
        }
        let mut route_keys = self.routes.allowed.keys().chain(self.routes.protected.keys());
        if let Some(bad) = route_keys.find(|k| !k.starts_with('/')) {
            return Err(ConfigError::Validation(format!(
                "route rule '{bad}' must start with '/'"
            )));
        }
        if self.related.limit == 0 {
            return Err(ConfigError::Validation("related.limit must be at least 1".into()));
        }
        let weights = [
            ("pillar", self.related.pillar),
            ("category", self.related.category),
            ("tag", self.related.tag),
            ("keyword", self.related.keyword),
        ];
        if let Some((key, _)) = weights.iter().find(|(_, w)| *w > MAX_RELATED_WEIGHT) {
            return Err(ConfigError::Validation(format!(
                "related.{key} must be at most {MAX_RELATED_WEIGHT}"
            )));
        }
        if self.cache.policy == CachePolicy::Ttl && self.cache.ttl_seconds == 0 {
            return Err(ConfigError::Validation(
                "cache.ttl_seconds must be non-zero when policy is \"ttl\"".into(),
            ));
        }
        if self.session.cookie_name.is_empty()
            || !self
                .session
                .cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ConfigError::Validation(
                "session.cookie_name must be non-empty ASCII letters, digits, '_' or '-'".into(),
            ));
        }
        if self.session.ttl_minutes == 0 || self.session.ttl_minutes > MAX_SESSION_TTL_MINUTES {
            return Err(ConfigError::Validation(format!(
                "session.ttl_minutes must be between 1 and {MAX_SESSION_TTL_MINUTES}"
            )));
        }
        Ok(())
    }

    /// Collection by name.
    pub fn collection(&self, name: &str) -> Option<&CollectionConfig> {
        self.collections.get(name)
    }
}

/// Site identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSection {
    /// Site title shown in the header and page titles.
    pub title: String,
    /// Public origin of the site. Media URLs on this origin are rewritten to
    /// root-relative paths. Empty disables rewriting.
    pub origin: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            title: "Portfolio".to_string(),
            origin: String::new(),
        }
    }
}

/// One content directory and the route it is published under.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectionConfig {
    /// Directory as path segments relative to the source root.
    pub dir: Vec<String>,
    /// Public route prefix, e.g. `/blog`.
    pub route: String,
    /// Heading of the collection index page.
    pub title: String,
}

/// What the gate does with a path no rule mentions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefaultPolicy {
    /// Unlisted paths are reachable.
    #[default]
    PermitByDefault,
    /// Unlisted paths render not-found.
    DenyByDefault,
}

/// Route allow-list and shared-secret protection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutesConfig {
    pub default_policy: DefaultPolicy,
    /// Path or prefix → enabled. Exact entries win over prefixes.
    pub allowed: BTreeMap<String, bool>,
    /// Path or prefix → requires the shared secret.
    pub protected: BTreeMap<String, bool>,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        let allowed = ["/", "/blog", "/work"]
            .into_iter()
            .map(|r| (r.to_string(), true))
            .collect();
        Self {
            default_policy: DefaultPolicy::default(),
            allowed,
            protected: BTreeMap::new(),
        }
    }
}

/// Related-content scoring.
///
/// Score = `pillar` × same pillar + `category` × shared categories
/// + `tag` × shared tags + `keyword` × shared keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelatedConfig {
    /// Maximum number of related items shown.
    pub limit: usize,
    pub pillar: u32,
    pub category: u32,
    pub tag: u32,
    pub keyword: u32,
}

impl Default for RelatedConfig {
    fn default() -> Self {
        Self {
            limit: 3,
            pillar: 5,
            category: 3,
            tag: 2,
            keyword: 1,
        }
    }
}

/// How long a directory scan may be reused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CachePolicy {
    /// Re-read the directory on every request.
    #[default]
    None,
    /// Reuse a scan for `ttl_seconds`.
    Ttl,
    /// Reuse a scan until a write through the content editor invalidates it.
    InvalidateOnWrite,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub policy: CachePolicy,
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            policy: CachePolicy::None,
            ttl_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Cookie carrying the session token.
    pub cookie_name: String,
    /// Session lifetime after unlocking.
    pub ttl_minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "folio_session".to_string(),
            ttl_minutes: 60,
        }
    }
}

/// Values read from the environment once at startup.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    /// Shared secret unlocking protected routes. `None` means nothing unlocks.
    pub access_password: Option<String>,
    /// Emails promoted to admin on sign-in.
    pub admin_emails: Vec<String>,
}

impl Secrets {
    /// Build from raw environment values. The allowlist is comma-separated.
    pub fn from_env_values(password: Option<String>, admin_emails: Option<&str>) -> Self {
        Self {
            access_password: password.filter(|p| !p.is_empty()),
            admin_emails: admin_emails
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

// =============================================================================
// Loading: stock defaults, then config.toml
// =============================================================================

/// `SiteConfig::default()` as TOML, the base every `config.toml` is laid over.
fn stock_defaults() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
}

/// Lay a user `config.toml` over the stock defaults.
///
/// Tables merge key by key, so `[collections.journal]` adds a collection next
/// to the stock `blog` and `work`, and a `[routes.protected]` entry joins the
/// stock route rules instead of replacing them. Any other value in `overlay`
/// replaces the stock one.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut merged), toml::Value::Table(user)) => {
            for (key, value) in user {
                let value = match merged.remove(&key) {
                    Some(stock) => merge_toml(stock, value),
                    None => value,
                };
                merged.insert(key, value);
            }
            toml::Value::Table(merged)
        }
        (_, replacement) => replacement,
    }
}

/// The `config.toml` at the source root, or `None` when the site has none.
fn read_site_file(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    match fs::read_to_string(root.join("config.toml")) {
        Ok(text) => Ok(Some(toml::from_str(&text)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Load the site configuration for the source root: stock defaults, then
/// the root's `config.toml` if present, then [`SiteConfig::validate`].
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let mut value = stock_defaults()?;
    if let Some(user) = read_site_file(root)? {
        value = merge_toml(value, user);
    }
    let config: SiteConfig = value.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# folio configuration
# ===================
# All settings are optional. Values shown below are the defaults.
# Place this file at the root of the source directory.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site
# ---------------------------------------------------------------------------
[site]
title = "Portfolio"
# Public origin, e.g. "https://example.com". Images pointing at this origin
# are rewritten to root-relative paths. Empty disables rewriting.
origin = ""

# ---------------------------------------------------------------------------
# Collections: one content directory each, published under `route`.
# `dir` is a list of path segments relative to the source root.
# ---------------------------------------------------------------------------
[collections.blog]
dir = ["blog"]
route = "/blog"
title = "Blog"

[collections.work]
dir = ["work"]
route = "/work"
title = "Work"

# ---------------------------------------------------------------------------
# Route gate
# ---------------------------------------------------------------------------
[routes]
# What happens to a path no rule mentions: "permit-by-default" or
# "deny-by-default".
default_policy = "permit-by-default"

# Exact paths or prefixes. An exact entry wins; otherwise the longest prefix
# decides ("/blog" covers "/blog/post-1").
[routes.allowed]
"/" = true
"/blog" = true
"/work" = true

# Paths or prefixes that require the shared access password
# (FOLIO_PASSWORD in the environment). Any true entry covering a path locks
# it; a nested false entry does not unlock it.
[routes.protected]

# ---------------------------------------------------------------------------
# Related content scoring
# ---------------------------------------------------------------------------
[related]
limit = 3
pillar = 5
category = 3
tag = 2
keyword = 1

# ---------------------------------------------------------------------------
# Content repository caching: "none", "ttl" or "invalidate-on-write"
# ---------------------------------------------------------------------------
[cache]
policy = "none"
ttl_seconds = 60

# ---------------------------------------------------------------------------
# Sessions issued after unlocking a protected route
# ---------------------------------------------------------------------------
[session]
cookie_name = "folio_session"
ttl_minutes = 60
"##
}
