//! `search_all_chat_spaces`: find spaces by display name

use std::sync::Arc;

use credential_flow::{CredentialCache, Resolution, Resolver};
use google_auth::{SCOPE_SPACES_READONLY, ScopeSet};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::chat::{ChatClient, ChatError, Space};
use crate::{Invocation, Tool, ToolFuture, ToolOutcome, api_error, parse_args};

#[derive(Debug, Deserialize)]
struct SearchArgs {
    display_name_query: String,
}

/// Lists every space the user can see and keeps those whose display name
/// contains the query, ignoring case.
pub struct SearchSpacesTool {
    resolver: Arc<Resolver>,
    client: ChatClient,
}

impl SearchSpacesTool {
    pub const NAME: &'static str = "search_all_chat_spaces";

    pub fn new(resolver: Arc<Resolver>, client: ChatClient) -> Self {
        Self { resolver, client }
    }

    async fn run(
        &self,
        cache: &mut CredentialCache,
        invocation: Invocation,
    ) -> crate::Result<ToolOutcome> {
        let args: SearchArgs = parse_args(&invocation.args)?;
        let context = invocation.context(self.required_scopes());

        let bundle = match self.resolver.resolve(cache, &context).await? {
            Resolution::Ready(bundle) => bundle,
            Resolution::Suspended(signal) => return Ok(ToolOutcome::Pending(signal)),
        };

        let spaces = match self.client.list_spaces(&bundle.access_token).await {
            Ok(spaces) => spaces,
            Err(ChatError::Api { reason, .. }) => {
                return Ok(ToolOutcome::Completed(api_error(&reason)));
            }
            Err(e) => return Err(e.into()),
        };

        let matches = filter_spaces(&spaces, &args.display_name_query);
        debug!(total = spaces.len(), matched = matches.len(), "space search finished");
        Ok(ToolOutcome::Completed(render(matches)))
    }
}

fn filter_spaces<'a>(spaces: &'a [Space], query: &str) -> Vec<&'a Space> {
    let needle = query.to_lowercase();
    spaces
        .iter()
        .filter(|space| {
            space
                .display_name
                .as_deref()
                .unwrap_or("")
                .to_lowercase()
                .contains(&needle)
        })
        .collect()
}

fn render(matches: Vec<&Space>) -> Value {
    if matches.is_empty() {
        return json!({"status": "success", "message": "No chat spaces found matching your query."});
    }
    let found: Vec<Value> = matches
        .into_iter()
        .map(|space| json!({"displayName": space.display_name, "name": space.name}))
        .collect();
    json!({"status": "success", "found_spaces": found})
}

impl Tool for SearchSpacesTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Searches all of the user's Google Chat spaces by display name"
    }

    fn required_scopes(&self) -> ScopeSet {
        ScopeSet::from([SCOPE_SPACES_READONLY.to_owned()])
    }

    fn invoke<'a>(
        &'a self,
        cache: &'a mut CredentialCache,
        invocation: Invocation,
    ) -> ToolFuture<'a> {
        Box::pin(self.run(cache, invocation))
    }
}
