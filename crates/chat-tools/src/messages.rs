//! `list_space_messages`: recent messages in one space

use std::sync::Arc;

use credential_flow::{CredentialCache, Resolution, Resolver};
use google_auth::{SCOPE_MESSAGES_READONLY, ScopeSet};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::chat::{ChatClient, ChatError, Message};
use crate::error::ToolError;
use crate::{Invocation, Tool, ToolFuture, ToolOutcome, api_error, parse_args};

#[derive(Debug, Deserialize)]
struct ListArgs {
    parent: String,
    #[serde(default)]
    filter: Option<String>,
}

/// Lists messages newest first, up to the client's message limit.
pub struct ListMessagesTool {
    resolver: Arc<Resolver>,
    client: ChatClient,
}

impl ListMessagesTool {
    pub const NAME: &'static str = "list_space_messages";

    pub fn new(resolver: Arc<Resolver>, client: ChatClient) -> Self {
        Self { resolver, client }
    }

    async fn run(
        &self,
        cache: &mut CredentialCache,
        invocation: Invocation,
    ) -> crate::Result<ToolOutcome> {
        let args: ListArgs = parse_args(&invocation.args)?;
        validate_parent(&args.parent)?;
        let filter = args.filter.as_deref().filter(|f| !f.trim().is_empty());
        let context = invocation.context(self.required_scopes());

        let bundle = match self.resolver.resolve(cache, &context).await? {
            Resolution::Ready(bundle) => bundle,
            Resolution::Suspended(signal) => return Ok(ToolOutcome::Pending(signal)),
        };

        match self
            .client
            .list_messages(&bundle.access_token, &args.parent, filter)
            .await
        {
            Ok(messages) => {
                debug!(parent = %args.parent, count = messages.len(), "messages listed");
                Ok(ToolOutcome::Completed(render(&messages)))
            }
            Err(ChatError::Api { reason, .. }) => Ok(ToolOutcome::Completed(api_error(&reason))),
            Err(e) => Err(e.into()),
        }
    }
}

/// `parent` must be a space resource name, `spaces/{id}`.
fn validate_parent(parent: &str) -> crate::Result<()> {
    match parent.strip_prefix("spaces/") {
        Some(id) if !id.is_empty() && !id.contains(['/', '?', '#']) => Ok(()),
        _ => Err(ToolError::InvalidArguments(format!(
            "parent must look like spaces/<id>, got {parent:?}"
        ))),
    }
}

fn render(messages: &[Message]) -> Value {
    let items: Vec<Value> = messages
        .iter()
        .map(|m| json!({"author": m.author(), "text": m.text, "createTime": m.create_time}))
        .collect();
    json!({"messages": items})
}

impl Tool for ListMessagesTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Lists recent messages in a Google Chat space, optionally filtered"
    }

    fn required_scopes(&self) -> ScopeSet {
        ScopeSet::from([SCOPE_MESSAGES_READONLY.to_owned()])
    }

    fn invoke<'a>(
        &'a self,
        cache: &'a mut CredentialCache,
        invocation: Invocation,
    ) -> ToolFuture<'a> {
        Box::pin(self.run(cache, invocation))
    }
}
