//! Consent-response detection and redirect URL parsing
//!
//! `detect` is the cheap check run on every resolution that finds no usable
//! bundle. Parsing the redirect URL only happens once a response is present.

use url::Url;

use crate::context::{ConsentArtifact, ConsentResponse, SessionContext};
use crate::error::{Error, Result};

/// Return the consent response attached to this invocation, if any.
pub fn detect(context: &SessionContext) -> Option<&ConsentResponse> {
    match &context.artifact {
        ConsentArtifact::NoArtifact => None,
        ConsentArtifact::ConsentResponse(response) => Some(response),
    }
}

/// Authorization code and state extracted from a redirect URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationResponse {
    pub code: String,
    pub state: String,
}

impl ConsentResponse {
    /// Extract `code` and `state` from the redirect URL.
    ///
    /// An `error=` parameter (e.g. `access_denied`) means the user declined
    /// on the consent screen.
    pub fn parse(&self) -> Result<AuthorizationResponse> {
        let url = Url::parse(self.raw_redirect_url.trim())
            .map_err(|e| Error::ConsentExchange(format!("redirect URL is malformed: {e}")))?;

        let mut code = None;
        let mut state = None;
        for (name, value) in url.query_pairs() {
            match name.as_ref() {
                "error" => {
                    return Err(Error::ConsentExchange(format!(
                        "consent was not granted: {value}"
                    )));
                }
                "code" if !value.is_empty() => code = Some(value.into_owned()),
                "state" if !value.is_empty() => state = Some(value.into_owned()),
                _ => {}
            }
        }

        let code = code.ok_or_else(|| {
            Error::ConsentExchange("redirect URL has no authorization code".into())
        })?;
        let state = state
            .ok_or_else(|| Error::ConsentExchange("redirect URL has no state token".into()))?;
        Ok(AuthorizationResponse { code, state })
    }
}
