//! Error types for Google OAuth operations

/// Errors from token endpoint and authorization URL operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// Google answers `invalid_grant` for revoked, expired, or reused
    /// refresh tokens and authorization codes.
    #[error("grant rejected: {0}")]
    InvalidGrant(String),

    #[error("invalid client credentials: {0}")]
    InvalidCredentials(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
