//! Google Chat tools that pause for user consent
//!
//! Each tool declares the OAuth scopes it needs and resolves credentials
//! through the shared `Resolver` before touching the Chat API. When the
//! resolver suspends, the tool returns `ToolOutcome::Pending` and the caller
//! re-invokes it with the consent redirect attached.

pub mod chat;
pub mod error;
pub mod messages;
pub mod spaces;

pub use chat::{ChatClient, ChatError, DEFAULT_BASE_URL, DEFAULT_MESSAGE_LIMIT, Message, Space};
pub use error::{Result, ToolError};
pub use messages::ListMessagesTool;
pub use spaces::SearchSpacesTool;

use std::future::Future;
use std::pin::Pin;

use credential_flow::{ConsentArtifact, CredentialCache, SessionContext, SessionKey, SuspendSignal};
use google_auth::ScopeSet;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// What a tool invocation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// Finished, including Google API rejections rendered as error results
    Completed(Value),
    /// Waiting on the browser consent step
    Pending(SuspendSignal),
}

impl ToolOutcome {
    /// JSON result as the caller sees it.
    pub fn to_json(&self) -> Value {
        match self {
            ToolOutcome::Completed(value) => value.clone(),
            ToolOutcome::Pending(_) => {
                json!({"status": "pending", "message": "Awaiting user authentication."})
            }
        }
    }
}

/// One call to a tool: who is calling, what they attached, and the arguments.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub session_key: SessionKey,
    pub artifact: ConsentArtifact,
    pub args: Value,
}

impl Invocation {
    pub fn new(session_key: SessionKey, args: Value) -> Self {
        Self {
            session_key,
            artifact: ConsentArtifact::NoArtifact,
            args,
        }
    }

    pub fn with_artifact(mut self, artifact: ConsentArtifact) -> Self {
        self.artifact = artifact;
        self
    }

    pub(crate) fn context(&self, required_scopes: ScopeSet) -> SessionContext {
        SessionContext {
            session_key: self.session_key.clone(),
            artifact: self.artifact.clone(),
            required_scopes,
        }
    }
}

pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = Result<ToolOutcome>> + Send + 'a>>;

/// A callable the orchestrating caller can dispatch by name.
///
/// Uses `Pin<Box<dyn Future>>` so tools can be held as `Box<dyn Tool>`.
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Scopes this tool asks the user to grant, and nothing more.
    fn required_scopes(&self) -> ScopeSet;

    fn invoke<'a>(
        &'a self,
        cache: &'a mut CredentialCache,
        invocation: Invocation,
    ) -> ToolFuture<'a>;
}

fn parse_args<T: DeserializeOwned>(args: &Value) -> Result<T> {
    serde_json::from_value(args.clone()).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Result for a Chat API rejection.
fn api_error(reason: &str) -> Value {
    json!({"status": "error", "message": format!("An API error occurred: {reason}")})
}
