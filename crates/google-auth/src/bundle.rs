//! OAuth credential bundle
//!
//! `expires` is a unix timestamp in milliseconds (absolute, not a delta),
//! computed when the bundle is built from `TokenResponse.expires_in` plus the
//! current wall clock. All expiry comparisons use `now_millis()`.

use std::collections::BTreeSet;
use std::fmt;

use crate::token::TokenResponse;

/// Set of OAuth scope strings. Ordered so URLs and logs are deterministic.
pub type ScopeSet = BTreeSet<String>;

/// Current wall clock as unix milliseconds.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Parse the space-separated `scope` field of a token response.
pub fn parse_scopes(raw: &str) -> ScopeSet {
    raw.split_whitespace().map(str::to_owned).collect()
}

/// Access/refresh token pair with expiry and granted scopes.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialBundle {
    pub access_token: String,
    /// Absent when the provider issued no refresh token
    pub refresh_token: Option<String>,
    /// Expiration as unix timestamp in milliseconds
    pub expires: u64,
    pub scopes: ScopeSet,
}

impl CredentialBundle {
    /// Build a bundle from a token endpoint response received at `now`.
    ///
    /// Google omits `refresh_token` on refresh responses and may omit `scope`;
    /// the previous values are carried over in that case.
    pub fn from_token_response(
        response: TokenResponse,
        now: u64,
        previous_refresh: Option<String>,
        fallback_scopes: &ScopeSet,
    ) -> Self {
        let scopes = match response.scope.as_deref() {
            Some(raw) if !raw.trim().is_empty() => parse_scopes(raw),
            _ => fallback_scopes.clone(),
        };
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh),
            expires: now.saturating_add(response.expires_in.saturating_mul(1000)),
            scopes,
        }
    }

    /// A token whose expiry equals `now` is already expired.
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expires <= now
    }

    /// Required scopes this bundle was not granted.
    pub fn missing_scopes(&self, required: &ScopeSet) -> ScopeSet {
        required.difference(&self.scopes).cloned().collect()
    }
}

// Tokens stay out of Debug output so bundles can be logged with `?`.
impl fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialBundle")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires", &self.expires)
            .field("scopes", &self.scopes)
            .finish()
    }
}
