//! Shared-secret sessions and admin roles.
//!
//! Protected routes unlock with one site-wide secret (`FOLIO_PASSWORD`).
//! Submitting the right secret yields a [`Session`]: an opaque random token
//! that travels back in an `HttpOnly` cookie and is checked on every
//! protected navigation. The secret itself is only ever held as a SHA-256
//! digest and compared in constant time.

use crate::config::{MAX_SESSION_TTL_MINUTES, SessionConfig};
use crate::gate::{SecretExchange, SessionCheck};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("incorrect secret")]
    InvalidSecret,
    #[error("no access secret is configured")]
    NotConfigured,
    #[error("session service unavailable: {0}")]
    Unavailable(String),
    #[error("admin role required")]
    Forbidden,
}

impl SessionError {
    /// Message shown on the lock screen.
    pub fn user_message(&self) -> &'static str {
        match self {
            SessionError::InvalidSecret => "Incorrect password.",
            SessionError::NotConfigured => "This page cannot be unlocked right now.",
            SessionError::Unavailable(_) => "Could not check the password. Please try again.",
            SessionError::Forbidden => "You do not have access to this page.",
        }
    }
}

/// An issued session token and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// `Set-Cookie` value carrying this session.
    pub fn cookie(&self, name: &str, now: DateTime<Utc>) -> String {
        let max_age = (self.expires_at - now).num_seconds().max(0);
        format!(
            "{name}={}; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age={max_age}",
            self.token
        )
    }
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_cookie(name: &str) -> String {
    format!("{name}=; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age=0")
}

/// Value of cookie `name` in a `Cookie:` request header.
pub fn token_from_cookie_header<'h>(header: &'h str, name: &str) -> Option<&'h str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// Verifies the shared secret and keeps the set of live sessions.
pub struct SessionAuthority {
    secret_digest: Option<[u8; 32]>,
    ttl: Duration,
    sessions: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl SessionAuthority {
    /// `secret` of `None` means no secret unlocks anything.
    pub fn new(secret: Option<&str>, config: &SessionConfig) -> Self {
        Self {
            secret_digest: secret.map(digest),
            ttl: Duration::minutes(config.ttl_minutes.min(MAX_SESSION_TTL_MINUTES) as i64),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret_digest.is_some()
    }

    pub fn verify_secret(&self, submitted: &str) -> Result<(), SessionError> {
        let expected = self.secret_digest.as_ref().ok_or(SessionError::NotConfigured)?;
        if constant_time_eq(expected, &digest(submitted)) {
            Ok(())
        } else {
            Err(SessionError::InvalidSecret)
        }
    }

    /// Exchange a submitted secret for a new session.
    pub fn exchange_at(&self, submitted: &str, now: DateTime<Utc>) -> Result<Session, SessionError> {
        self.verify_secret(submitted)?;
        Ok(self.issue_at(now))
    }

    pub fn issue_at(&self, now: DateTime<Utc>) -> Session {
        let session = Session {
            token: new_token(),
            expires_at: now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        self.sessions
            .lock()
            .insert(session.token.clone(), session.expires_at);
        debug!(expires_at = %session.expires_at, "session issued");
        session
    }

    /// Whether `token` names a live session at `now`. Expired tokens are
    /// forgotten on sight.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        let mut sessions = self.sessions.lock();
        match sessions.get(token) {
            Some(expires_at) if *expires_at > now => true,
            Some(_) => {
                sessions.remove(token);
                false
            }
            None => false,
        }
    }

    pub fn validate(&self, token: &str) -> bool {
        self.validate_at(token, Utc::now())
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.sessions.lock().remove(token).is_some()
    }

    /// Drop every session expired at `now`, returning how many went.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, expires_at| *expires_at > now);
        before - sessions.len()
    }

    pub fn live_sessions(&self) -> usize {
        self.sessions.lock().len()
    }
}

impl SessionCheck for SessionAuthority {
    fn is_authenticated(&self, token: Option<&str>) -> Result<bool, SessionError> {
        Ok(token.is_some_and(|t| self.validate(t)))
    }
}

impl SecretExchange for SessionAuthority {
    fn exchange(&self, secret: &str) -> Result<Session, SessionError> {
        self.exchange_at(secret, Utc::now())
    }
}

fn digest(secret: &str) -> [u8; 32] {
    Sha256::digest(secret.as_bytes()).into()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn new_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().r#gen();
    hex::encode(bytes)
}

// =============================================================================
// Roles
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Visitor,
    Admin,
}

impl Role {
    /// Admin when `email` is on the allowlist (case-insensitive).
    pub fn resolve(email: Option<&str>, allowlist: &[String]) -> Role {
        let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
            return Role::Visitor;
        };
        if allowlist.iter().any(|a| a.trim().eq_ignore_ascii_case(email)) {
            Role::Admin
        } else {
            Role::Visitor
        }
    }
}

/// A signed-in user as the admin pages see them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: Option<String>,
    pub role: Role,
}

impl Identity {
    pub fn new(email: Option<&str>, allowlist: &[String]) -> Self {
        Self {
            email: email.map(str::to_string),
            role: Role::resolve(email, allowlist),
        }
    }

    pub fn require_admin(&self) -> Result<(), SessionError> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Visitor => Err(SessionError::Forbidden),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn authority(secret: Option<&str>) -> SessionAuthority {
        SessionAuthority::new(
            secret,
            &SessionConfig {
                cookie_name: "folio_session".into(),
                ttl_minutes: 60,
            },
        )
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn correct_secret_issues_session() {
        let auth = authority(Some("hunter2"));
        let session = auth.exchange_at("hunter2", noon()).unwrap();
        assert_eq!(session.token.len(), 64);
        assert!(session.token.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
        assert_ne!(session.token, auth.exchange_at("hunter2", noon()).unwrap().token);
        assert_eq!(session.expires_at, noon() + Duration::minutes(60));
        assert!(auth.validate_at(&session.token, noon()));
    }

    #[test]
    fn session_lifetime_is_capped() {
        let config = SessionConfig {
            ttl_minutes: u64::MAX / 2,
            ..SessionConfig::default()
        };
        let auth = SessionAuthority::new(Some("s"), &config);
        let session = auth.exchange_at("s", noon()).unwrap();
        assert_eq!(
            session.expires_at,
            noon() + Duration::minutes(MAX_SESSION_TTL_MINUTES as i64)
        );
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let auth = authority(Some("hunter2"));
        assert_eq!(auth.exchange_at("hunter3", noon()), Err(SessionError::InvalidSecret));
        assert_eq!(auth.live_sessions(), 0);
    }

    #[test]
    fn missing_secret_unlocks_nothing() {
        let auth = authority(None);
        assert!(!auth.is_configured());
        assert_eq!(auth.verify_secret(""), Err(SessionError::NotConfigured));
    }

    #[test]
    fn tokens_are_unique() {
        let auth = authority(Some("s"));
        let a = auth.issue_at(noon());
        let b = auth.issue_at(noon());
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn expired_session_is_invalid_and_forgotten() {
        let auth = authority(Some("s"));
        let session = auth.issue_at(noon());
        assert!(!auth.validate_at(&session.token, noon() + Duration::minutes(61)));
        assert_eq!(auth.live_sessions(), 0);
    }

    #[test]
    fn revoke_and_purge() {
        let auth = authority(Some("s"));
        let a = auth.issue_at(noon());
        auth.issue_at(noon() - Duration::hours(2));
        assert_eq!(auth.purge_expired(noon()), 1);
        assert!(auth.revoke(&a.token));
        assert!(!auth.revoke(&a.token));
        assert!(!auth.validate_at(&a.token, noon()));
    }

    #[test]
    fn session_check_without_token_is_unauthenticated() {
        let auth = authority(Some("s"));
        assert_eq!(auth.is_authenticated(None), Ok(false));
        assert_eq!(auth.is_authenticated(Some("bogus")), Ok(false));
    }

    #[test]
    fn cookie_attributes() {
        let session = Session {
            token: "abc".into(),
            expires_at: noon() + Duration::minutes(5),
        };
        assert_eq!(
            session.cookie("folio_session", noon()),
            "folio_session=abc; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age=300"
        );
        assert!(clear_cookie("folio_session").ends_with("Max-Age=0"));
    }

    #[test]
    fn cookie_header_lookup() {
        let header = "theme=dark; folio_session=tok123; other=1";
        assert_eq!(token_from_cookie_header(header, "folio_session"), Some("tok123"));
        assert_eq!(token_from_cookie_header(header, "missing"), None);
        assert_eq!(token_from_cookie_header("folio_session=", "folio_session"), None);
    }

    #[test]
    fn admin_resolution_is_case_insensitive() {
        let allow = vec!["Owner@Example.com".to_string()];
        assert_eq!(Role::resolve(Some("owner@example.com"), &allow), Role::Admin);
        assert_eq!(Role::resolve(Some("guest@example.com"), &allow), Role::Visitor);
        assert_eq!(Role::resolve(None, &allow), Role::Visitor);
        assert_eq!(Role::resolve(Some(""), &[String::new()]), Role::Visitor);
    }

    #[test]
    fn require_admin() {
        let allow = vec!["a@b.c".to_string()];
        assert!(Identity::new(Some("a@b.c"), &allow).require_admin().is_ok());
        assert_eq!(
            Identity::new(Some("x@y.z"), &allow).require_admin(),
            Err(SessionError::Forbidden)
        );
    }
}
