//! Explicit per-invocation session context

use google_auth::ScopeSet;

use crate::cache::SessionKey;

/// Raw redirect URL the user's browser landed on after the consent screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentResponse {
    pub raw_redirect_url: String,
}

impl ConsentResponse {
    pub fn new(raw_redirect_url: impl Into<String>) -> Self {
        Self {
            raw_redirect_url: raw_redirect_url.into(),
        }
    }
}

/// What the caller attached to this invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConsentArtifact {
    /// Ordinary invocation
    #[default]
    NoArtifact,
    /// Re-invocation after the user completed the consent step
    ConsentResponse(ConsentResponse),
}

/// Everything one credential resolution needs to know about its caller.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_key: SessionKey,
    pub artifact: ConsentArtifact,
    pub required_scopes: ScopeSet,
}

impl SessionContext {
    pub fn new(session_key: SessionKey, required_scopes: ScopeSet) -> Self {
        Self {
            session_key,
            artifact: ConsentArtifact::NoArtifact,
            required_scopes,
        }
    }

    pub fn with_consent_response(mut self, response: ConsentResponse) -> Self {
        self.artifact = ConsentArtifact::ConsentResponse(response);
        self
    }
}
