//! Error types for credential resolution
//!
//! Suspension for consent is not represented here: it is a normal
//! `Resolution::Suspended` outcome, never an `Err`.

use google_auth::ScopeSet;

/// Errors from credential resolution.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Google rejected the refresh token (revoked or expired) or the client
    /// credentials. The bundle is dead; the resolver evicts it and falls
    /// through to consent.
    #[error("token refresh failed: {0}")]
    Refresh(String),

    /// The refresh call did not get a verdict (network error, 5xx). The
    /// bundle is kept so the next resolution retries the refresh.
    #[error("token refresh unavailable: {0}")]
    RefreshUnavailable(String),

    /// The redirect URL supplied after consent could not be turned into
    /// credentials. The caller must restart the consent step.
    #[error("consent exchange failed: {0}")]
    ConsentExchange(String),

    /// A bundle lacks scopes the calling tool needs.
    #[error("insufficient scope, missing: {}", join_scopes(.missing))]
    InsufficientScope { missing: ScopeSet },

    /// The consent URL could not be built from the configured endpoints.
    #[error("authorization setup failed: {0}")]
    Setup(String),
}

impl Error {
    /// Whether the caller should restart the browser consent step.
    pub fn requires_new_consent(&self) -> bool {
        matches!(self, Error::ConsentExchange(_))
    }
}

fn join_scopes(scopes: &ScopeSet) -> String {
    scopes.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
}

/// Result alias for resolution operations.
pub type Result<T> = std::result::Result<T, Error>;
