//! Google OAuth building blocks for the Chat consent flow
//!
//! PKCE and state generation, authorization URL construction, the
//! `CredentialBundle` data model, and the token endpoint client. The
//! resolution state machine that ties these together lives in
//! `credential-flow`; this crate performs no caching of its own.
//!
//! Credential flow:
//! 1. `pkce::generate_verifier()` + `pkce::generate_state()`
//! 2. User consents at `pkce::build_authorization_url()`
//! 3. `TokenEndpoint::exchange_code()` turns the returned code into tokens
//! 4. `CredentialBundle::from_token_response()` stamps an absolute expiry
//! 5. `TokenEndpoint::refresh()` renews the access token once it expires

pub mod bundle;
pub mod constants;
pub mod error;
pub mod pkce;
pub mod token;

pub use bundle::{CredentialBundle, ScopeSet, now_millis, parse_scopes};
pub use constants::*;
pub use error::{Error, Result};
pub use pkce::{AuthorizationParams, build_authorization_url, compute_challenge, generate_state, generate_verifier};
pub use token::{GoogleTokenEndpoint, TokenEndpoint, TokenFuture, TokenResponse};
