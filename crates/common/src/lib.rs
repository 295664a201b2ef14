//! Shared types for the Google Chat consent workbench
//!
//! Secrets (OAuth client id/secret, tokens in transit) and the configuration
//! error type used by every crate that loads settings.

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
