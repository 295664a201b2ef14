//! In-memory credential cache keyed by session
//!
//! The cache is a pure store: `get` returns whatever was last stored and never
//! checks expiry or scopes. Alongside each bundle it keeps the pending consent
//! request (state token + PKCE verifier) the next consent response must match.
//!
//! There is no global instance. The owner passes `&mut CredentialCache` into
//! each resolution, so one flow of control touches a session at a time.

use std::collections::HashMap;
use std::fmt;

use google_auth::{CredentialBundle, ScopeSet};
use tracing::debug;

/// Key identifying one conversation/session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionKey {
    fn from(key: &str) -> Self {
        Self(key.to_owned())
    }
}

/// Consent request issued to the user and not yet answered.
#[derive(Clone)]
pub struct PendingConsent {
    pub state_token: String,
    /// PKCE verifier for the code exchange
    pub verifier: String,
    pub required_scopes: ScopeSet,
}

impl fmt::Debug for PendingConsent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingConsent")
            .field("state_token", &self.state_token)
            .field("verifier", &"[REDACTED]")
            .field("required_scopes", &self.required_scopes)
            .finish()
    }
}

#[derive(Debug, Default)]
struct SessionEntry {
    bundle: Option<CredentialBundle>,
    pending: Option<PendingConsent>,
}

impl SessionEntry {
    fn is_vacant(&self) -> bool {
        self.bundle.is_none() && self.pending.is_none()
    }
}

/// Process-lifetime session state. Dropped with the process, never persisted.
#[derive(Debug, Default)]
pub struct CredentialCache {
    sessions: HashMap<SessionKey, SessionEntry>,
}

impl CredentialCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last stored bundle for the session, expired or not.
    pub fn get(&self, key: &SessionKey) -> Option<CredentialBundle> {
        self.sessions.get(key).and_then(|e| e.bundle.clone())
    }

    /// Insert or replace the session's bundle.
    pub fn store(&mut self, key: SessionKey, bundle: CredentialBundle) {
        debug!(session = %key, expires = bundle.expires, "stored credential bundle");
        self.sessions.entry(key).or_default().bundle = Some(bundle);
    }

    /// Drop the session's bundle. Used after a failed refresh so a dead
    /// refresh token is not retried on every call.
    pub fn evict(&mut self, key: &SessionKey) -> Option<CredentialBundle> {
        let entry = self.sessions.get_mut(key)?;
        let removed = entry.bundle.take();
        if entry.is_vacant() {
            self.sessions.remove(key);
        }
        if removed.is_some() {
            debug!(session = %key, "evicted credential bundle");
        }
        removed
    }

    /// Record a freshly issued consent request, returning the one it replaced.
    pub fn issue_pending(
        &mut self,
        key: SessionKey,
        pending: PendingConsent,
    ) -> Option<PendingConsent> {
        self.sessions.entry(key).or_default().pending.replace(pending)
    }

    pub fn pending(&self, key: &SessionKey) -> Option<&PendingConsent> {
        self.sessions.get(key).and_then(|e| e.pending.as_ref())
    }

    /// Consume the pending consent request. A request is answered at most once.
    pub fn take_pending(&mut self, key: &SessionKey) -> Option<PendingConsent> {
        let entry = self.sessions.get_mut(key)?;
        let taken = entry.pending.take();
        if entry.is_vacant() {
            self.sessions.remove(key);
        }
        taken
    }

    /// Number of sessions holding a bundle.
    pub fn len(&self) -> usize {
        self.sessions.values().filter(|e| e.bundle.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
