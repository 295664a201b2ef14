//! Consent request emission
//!
//! When nothing in the cache or the invocation context yields credentials,
//! the emitter records a pending consent request for the session and hands
//! back a `SuspendSignal`. The tool returns that signal instead of a result;
//! the caller shows the URL and re-invokes with the redirect URL attached.

use common::Secret;
use google_auth::{
    AuthorizationParams, ScopeSet, build_authorization_url, compute_challenge, generate_state,
    generate_verifier,
};
use tracing::{debug, info};

use crate::cache::{CredentialCache, PendingConsent, SessionKey};
use crate::error::{Error, Result};

/// What the user must do: open `authorization_url` and grant the scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentRequest {
    pub authorization_url: String,
    pub required_scopes: ScopeSet,
    pub state_token: String,
}

/// Non-error outcome: the invocation cannot finish until the user consents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuspendSignal {
    pub request: ConsentRequest,
}

impl SuspendSignal {
    pub fn authorization_url(&self) -> &str {
        &self.request.authorization_url
    }

    pub fn state_token(&self) -> &str {
        &self.request.state_token
    }
}

/// Builds consent requests for one OAuth client.
pub struct ConsentEmitter {
    authorize_endpoint: String,
    client_id: Secret<String>,
    redirect_uri: String,
}

impl ConsentEmitter {
    pub fn new(
        authorize_endpoint: impl Into<String>,
        client_id: Secret<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            authorize_endpoint: authorize_endpoint.into(),
            client_id,
            redirect_uri: redirect_uri.into(),
        }
    }

    /// Issue a consent request for exactly `required_scopes`.
    ///
    /// A request already pending for the session is replaced; a redirect
    /// answering the older request will then fail the state check.
    pub fn request_consent(
        &self,
        cache: &mut CredentialCache,
        session_key: &SessionKey,
        required_scopes: &ScopeSet,
    ) -> Result<SuspendSignal> {
        let state_token = generate_state();
        let verifier = generate_verifier();
        let challenge = compute_challenge(&verifier);

        let authorization_url = build_authorization_url(&AuthorizationParams {
            authorize_endpoint: &self.authorize_endpoint,
            client_id: self.client_id.expose(),
            redirect_uri: &self.redirect_uri,
            scopes: required_scopes,
            state: &state_token,
            challenge: &challenge,
        })
        .map_err(|e| Error::Setup(e.to_string()))?;

        let replaced = cache.issue_pending(
            session_key.clone(),
            PendingConsent {
                state_token: state_token.clone(),
                verifier,
                required_scopes: required_scopes.clone(),
            },
        );
        if replaced.is_some() {
            debug!(session = %session_key, "replaced earlier pending consent request");
        }

        info!(session = %session_key, scopes = ?required_scopes, "consent required, suspending invocation");
        Ok(SuspendSignal {
            request: ConsentRequest {
                authorization_url,
                required_scopes: required_scopes.clone(),
                state_token,
            },
        })
    }
}
