//! Route access gate.
//!
//! Every navigation runs through a small state machine:
//!
//! ```text
//!             ┌─ route not enabled ──────────────▶ RouteDisabled   (not-found view)
//! Loading ────┼─ enabled, no secret required ────▶ Open            (render)
//!             └─ enabled, protected ── check ─┬──▶ Unlocked        (render)
//!                                             └──▶ LockPending ──secret──▶ Unlocked
//!                                                      ▲   │
//!                                                      └───┘ wrong secret / failure
//! ```
//!
//! Rule lookup: an exact entry for the path wins; otherwise the longest
//! configured prefix that matches on a segment boundary (`/blog` covers
//! `/blog/post-1` but not `/blogroll`); otherwise the configured default.
//! The root entry `/` matches only `/` itself. Protection is additive: a
//! path is locked when any `true` protected entry covers it, whatever more
//! specific entries say.
//!
//! Session checks are slow and may be overtaken by the next navigation.
//! [`RouteGate::navigate`] hands out a [`CheckTicket`] tagged with the
//! navigation's generation, and results presented with a ticket from an
//! earlier navigation are discarded. A failed check counts as not
//! authenticated and is never retried.

use crate::config::{DefaultPolicy, RoutesConfig};
use crate::session::{Session, SessionError};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Answers "does this session token belong to a live session?".
pub trait SessionCheck {
    fn is_authenticated(&self, token: Option<&str>) -> Result<bool, SessionError>;
}

/// Trades a submitted secret for a session.
pub trait SecretExchange {
    fn exchange(&self, secret: &str) -> Result<Session, SessionError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Loading,
    RouteDisabled,
    Open,
    LockPending { error: Option<String> },
    Unlocked,
}

impl GateState {
    /// Whether the page content may be shown.
    pub fn renders_content(&self) -> bool {
        matches!(self, GateState::Open | GateState::Unlocked)
    }
}

/// Proof that an async result belongs to a particular navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckTicket {
    generation: u64,
}

/// What the caller does after [`RouteGate::navigate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    NotFound,
    Render,
    /// Ask the session service, then call [`RouteGate::complete_check`].
    Check(CheckTicket),
}

/// Normalize a request path for rule lookup: query and fragment dropped,
/// leading slash ensured, trailing slash trimmed.
pub fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn covers(prefix: &str, path: &str) -> bool {
    prefix != "/"
        && path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Value of the most specific rule for `path`, if any rule applies.
fn lookup(rules: &BTreeMap<String, bool>, path: &str) -> Option<bool> {
    let mut best: Option<(usize, bool)> = None;
    for (key, value) in rules {
        let key = normalize_path(key);
        if key == path {
            return Some(*value);
        }
        if covers(&key, path) && best.is_none_or(|(len, _)| key.len() > len) {
            best = Some((key.len(), *value));
        }
    }
    best.map(|(_, value)| value)
}

/// Whether `path` may be navigated to at all.
pub fn is_route_enabled(rules: &RoutesConfig, path: &str) -> bool {
    let path = normalize_path(path);
    lookup(&rules.allowed, &path)
        .unwrap_or(rules.default_policy == DefaultPolicy::PermitByDefault)
}

/// Whether `path` sits behind the shared secret.
///
/// Any protecting entry that covers the path locks it; a more specific
/// `false` entry does not lift the lock of a protected prefix.
pub fn requires_secret(rules: &RoutesConfig, path: &str) -> bool {
    let path = normalize_path(path);
    rules
        .protected
        .iter()
        .any(|(key, protect)| *protect && {
            let key = normalize_path(key);
            key == path || covers(&key, &path)
        })
}

/// Gate state for one navigation context (one browser tab, one request).
#[derive(Debug, Clone)]
pub struct RouteGate {
    rules: RoutesConfig,
    path: String,
    generation: u64,
    state: GateState,
}

impl RouteGate {
    pub fn new(rules: RoutesConfig) -> Self {
        Self {
            rules,
            path: "/".to_string(),
            generation: 0,
            state: GateState::Loading,
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn current_ticket(&self) -> CheckTicket {
        CheckTicket {
            generation: self.generation,
        }
    }

    /// Start a navigation to `path`. Any check still in flight for the
    /// previous path is superseded.
    pub fn navigate(&mut self, path: &str) -> Navigation {
        self.generation += 1;
        self.path = normalize_path(path);

        if !is_route_enabled(&self.rules, &self.path) {
            debug!(path = %self.path, "route disabled");
            self.state = GateState::RouteDisabled;
            return Navigation::NotFound;
        }
        if !requires_secret(&self.rules, &self.path) {
            self.state = GateState::Open;
            return Navigation::Render;
        }
        self.state = GateState::Loading;
        Navigation::Check(self.current_ticket())
    }

    /// Apply a session check result. Returns `false` when the ticket is
    /// stale and the result was discarded.
    pub fn complete_check(&mut self, ticket: CheckTicket, result: Result<bool, SessionError>) -> bool {
        if ticket != self.current_ticket() || self.state != GateState::Loading {
            debug!(path = %self.path, "discarding stale session check");
            return false;
        }
        self.state = match result {
            Ok(true) => GateState::Unlocked,
            Ok(false) => GateState::LockPending { error: None },
            Err(e) => {
                warn!(path = %self.path, error = %e, "session check failed, treating as locked");
                GateState::LockPending { error: None }
            }
        };
        true
    }

    /// Apply the outcome of a secret submission made while locked. The
    /// session comes back only when the gate actually unlocked.
    pub fn submit_secret(
        &mut self,
        ticket: CheckTicket,
        result: Result<Session, SessionError>,
    ) -> Option<Session> {
        if ticket != self.current_ticket() || !matches!(self.state, GateState::LockPending { .. }) {
            debug!(path = %self.path, "discarding stale secret submission");
            return None;
        }
        match result {
            Ok(session) => {
                self.state = GateState::Unlocked;
                Some(session)
            }
            Err(e) => {
                self.state = GateState::LockPending {
                    error: Some(e.user_message().to_string()),
                };
                None
            }
        }
    }

    /// Submit `secret` through `exchange` synchronously.
    pub fn unlock(&mut self, exchange: &dyn SecretExchange, secret: &str) -> Option<Session> {
        let ticket = self.current_ticket();
        let result = exchange.exchange(secret);
        self.submit_secret(ticket, result)
    }

    /// Navigate and, when needed, run the session check synchronously.
    pub fn run(&mut self, path: &str, check: &dyn SessionCheck, token: Option<&str>) -> &GateState {
        if let Navigation::Check(ticket) = self.navigate(path) {
            let result = check.is_authenticated(token);
            self.complete_check(ticket, result);
        }
        &self.state
    }
}
