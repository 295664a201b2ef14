//! PKCE (RFC 7636), CSRF state, and the Google authorization URL
//!
//! The verifier and state are kept by the caller until the user returns
//! from the consent screen; the challenge and state travel in the URL so
//! Google can bind the authorization code to this particular request.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;
use sha2::{Digest, Sha256};
use url::Url;

use crate::bundle::ScopeSet;
use crate::error::{Error, Result};

/// Generate a cryptographically random PKCE code verifier.
///
/// 64 random bytes encode to 86 URL-safe base64 characters, inside the
/// 43-128 character range RFC 7636 allows.
pub fn generate_verifier() -> String {
    let mut bytes = [0u8; 64];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate an opaque state token for CSRF protection (32 random bytes).
pub fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compute the S256 code challenge: `BASE64URL(SHA256(verifier))`.
pub fn compute_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Inputs for one authorization URL.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationParams<'a> {
    pub authorize_endpoint: &'a str,
    pub client_id: &'a str,
    pub redirect_uri: &'a str,
    pub scopes: &'a ScopeSet,
    pub state: &'a str,
    pub challenge: &'a str,
}

/// Build the consent URL the user opens in a browser.
///
/// `access_type=offline` with `prompt=consent` makes Google issue a refresh
/// token on every exchange. `include_granted_scopes=true` turns per-tool
/// scope requests into incremental authorization, so the granted set grows
/// instead of being replaced.
pub fn build_authorization_url(params: &AuthorizationParams<'_>) -> Result<String> {
    let mut url = Url::parse(params.authorize_endpoint)
        .map_err(|e| Error::InvalidUrl(format!("authorization endpoint: {e}")))?;

    let scope = params
        .scopes
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");

    url.query_pairs_mut()
        .append_pair("client_id", params.client_id)
        .append_pair("redirect_uri", params.redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", &scope)
        .append_pair("state", params.state)
        .append_pair("code_challenge", params.challenge)
        .append_pair("code_challenge_method", "S256")
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent")
        .append_pair("include_granted_scopes", "true");

    Ok(url.to_string())
}
