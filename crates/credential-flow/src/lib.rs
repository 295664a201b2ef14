//! Credential lifecycle for tools that call Google APIs on a user's behalf
//!
//! A tool invocation asks the `Resolver` for credentials covering its scopes.
//! The resolver walks cache → refresh → consent response → consent request
//! and either returns a `CredentialBundle` or a `SuspendSignal` telling the
//! caller to run the browser consent step and re-invoke with the redirect URL.
//!
//! Bundle lifecycle:
//! 1. No bundle → consent requested, invocation suspended
//! 2. Caller re-invokes with the redirect URL → code exchanged, bundle cached
//! 3. Bundle expires → refreshed with its refresh token, cache overwritten
//! 4. Refresh rejected → bundle evicted, back to step 1
//!
//! The cache is passed by `&mut` into every resolution; there is no global
//! state and no lock.

pub mod cache;
pub mod context;
pub mod detector;
pub mod emitter;
pub mod error;
pub mod metrics;
pub mod refresher;
pub mod resolver;

pub use cache::{CredentialCache, PendingConsent, SessionKey};
pub use context::{ConsentArtifact, ConsentResponse, SessionContext};
pub use detector::{AuthorizationResponse, detect};
pub use emitter::{ConsentEmitter, ConsentRequest, SuspendSignal};
pub use error::{Error, Result};
pub use resolver::{Resolution, Resolver};
