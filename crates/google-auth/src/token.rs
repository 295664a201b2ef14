//! OAuth token exchange and refresh
//!
//! Handles the two token endpoint interactions:
//! 1. Authorization code exchange (completing the consent flow)
//! 2. Token refresh (renewing an expired access token)
//!
//! Both POST form-encoded bodies to the token endpoint with different grant
//! types. `TokenEndpoint` abstracts the endpoint so the resolution state
//! machine can be driven by a fake in tests.

use std::future::Future;
use std::pin::Pin;

use common::Secret;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Response from the token endpoint for both exchange and refresh.
///
/// `expires_in` is a delta in seconds from the response time.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Present on code exchange; omitted on refresh unless Google rotates it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_in: u64,
    /// Space-separated granted scopes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

/// OAuth error body (`{"error": "invalid_grant", "error_description": ...}`).
#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Boxed future returned by `TokenEndpoint` methods.
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<TokenResponse>> + Send + 'a>>;

/// Identity provider token endpoint.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Arc<dyn TokenEndpoint>`).
pub trait TokenEndpoint: Send + Sync {
    /// Exchange an authorization code plus its PKCE verifier for tokens.
    fn exchange_code<'a>(&'a self, code: &'a str, verifier: &'a str) -> TokenFuture<'a>;

    /// Obtain a new access token from a refresh token.
    fn refresh<'a>(&'a self, refresh_token: &'a str) -> TokenFuture<'a>;
}

/// Token endpoint client for a Google Cloud OAuth desktop client.
pub struct GoogleTokenEndpoint {
    client: reqwest::Client,
    token_url: String,
    client_id: Secret<String>,
    client_secret: Secret<String>,
    redirect_uri: String,
}

impl GoogleTokenEndpoint {
    pub fn new(
        client: reqwest::Client,
        token_url: impl Into<String>,
        client_id: Secret<String>,
        client_secret: Secret<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            client_id,
            client_secret,
            redirect_uri: redirect_uri.into(),
        }
    }

    async fn post_exchange(&self, code: &str, verifier: &str) -> Result<TokenResponse> {
        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("code_verifier", verifier),
                ("client_id", self.client_id.expose().as_str()),
                ("client_secret", self.client_secret.expose().as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::Http(format!("token exchange request failed: {e}")))?;

        debug!(status = %response.status(), "token exchange response");
        read_token_response(response, "token exchange").await
    }

    async fn post_refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.client_id.expose().as_str()),
                ("client_secret", self.client_secret.expose().as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::Http(format!("token refresh request failed: {e}")))?;

        debug!(status = %response.status(), "token refresh response");
        read_token_response(response, "token refresh").await
    }
}

impl TokenEndpoint for GoogleTokenEndpoint {
    fn exchange_code<'a>(&'a self, code: &'a str, verifier: &'a str) -> TokenFuture<'a> {
        Box::pin(self.post_exchange(code, verifier))
    }

    fn refresh<'a>(&'a self, refresh_token: &'a str) -> TokenFuture<'a> {
        Box::pin(self.post_refresh(refresh_token))
    }
}

async fn read_token_response(response: reqwest::Response, operation: &str) -> Result<TokenResponse> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(classify_failure(status.as_u16(), &body, operation));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| Error::TokenExchange(format!("invalid {operation} response: {e}")))
}

/// Map a non-success token endpoint response to an error variant.
///
/// `invalid_grant` means the code or refresh token is dead; 401/403 and
/// `invalid_client` mean the client id/secret pair is wrong.
fn classify_failure(status: u16, body: &str, operation: &str) -> Error {
    let parsed = serde_json::from_str::<OAuthErrorBody>(body).ok();
    let detail = match &parsed {
        Some(err) => match &err.error_description {
            Some(desc) => format!("{}: {desc}", err.error),
            None => err.error.clone(),
        },
        None => body.to_owned(),
    };

    match parsed.as_ref().map(|e| e.error.as_str()) {
        Some("invalid_grant") => Error::InvalidGrant(format!("{operation} ({status}): {detail}")),
        Some("invalid_client") | Some("unauthorized_client") => {
            Error::InvalidCredentials(format!("{operation} ({status}): {detail}"))
        }
        _ if status == 401 || status == 403 => {
            Error::InvalidCredentials(format!("{operation} ({status}): {detail}"))
        }
        _ => Error::TokenExchange(format!("{operation} returned {status}: {detail}")),
    }
}
