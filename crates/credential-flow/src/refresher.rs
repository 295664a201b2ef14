//! Token refresh without user interaction
//!
//! One attempt per call, no retries. A rejected refresh token is `Refresh`;
//! a call that never got Google's verdict is `RefreshUnavailable`. Either way
//! the resolver falls through to the consent flow.

use google_auth::{CredentialBundle, TokenEndpoint, now_millis};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Exchange the bundle's refresh token for a new access token.
///
/// The refresh token is carried over unless the provider rotates it; scopes
/// come from the response when Google reports them.
pub async fn refresh(
    endpoint: &dyn TokenEndpoint,
    bundle: &CredentialBundle,
) -> Result<CredentialBundle> {
    let refresh_token = bundle
        .refresh_token
        .as_deref()
        .ok_or_else(|| Error::Refresh("bundle has no refresh token".into()))?;

    debug!(expires = bundle.expires, "refreshing access token");
    match endpoint.refresh(refresh_token).await {
        Ok(response) => {
            let rotated = response.refresh_token.is_some();
            let refreshed = CredentialBundle::from_token_response(
                response,
                now_millis(),
                bundle.refresh_token.clone(),
                &bundle.scopes,
            );
            info!(rotated, expires = refreshed.expires, "token refresh succeeded");
            Ok(refreshed)
        }
        Err(
            e @ (google_auth::Error::InvalidGrant(_) | google_auth::Error::InvalidCredentials(_)),
        ) => {
            warn!(error = %e, "refresh token rejected");
            Err(Error::Refresh(e.to_string()))
        }
        Err(e) => {
            warn!(error = %e, "token refresh did not complete");
            Err(Error::RefreshUnavailable(e.to_string()))
        }
    }
}
