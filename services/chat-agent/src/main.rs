//! Google Chat consent workbench
//!
//! Interactive CLI that:
//! 1. Reads a command and maps it to a Chat tool call
//! 2. Runs the tool, which resolves credentials from the session cache
//! 3. On suspension, shows the consent URL and reads back the redirect URL
//! 4. Re-invokes the same tool with the redirect attached and prints the result

mod commands;
mod config;
mod error;
mod metrics;
mod session;

use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chat_tools::{ChatClient, Invocation, ListMessagesTool, SearchSpacesTool, Tool, ToolOutcome};
use credential_flow::{ConsentArtifact, ConsentEmitter, CredentialCache, Resolver, SessionKey};
use google_auth::GoogleTokenEndpoint;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::commands::{Command, HELP, ToolCall};
use crate::config::Config;
use crate::session::{TurnAction, TurnEvent, TurnState, handle_event};

type Prompt = Lines<BufReader<Stdin>>;

/// Everything one interactive session owns.
struct Agent {
    tools: Vec<Box<dyn Tool>>,
    cache: CredentialCache,
    session_key: SessionKey,
    prometheus: PrometheusHandle,
}

impl Agent {
    /// Drive one tool call to completion, including any consent round trip.
    async fn run_turn(&mut self, call: ToolCall, prompt: &mut Prompt) -> Result<()> {
        let (mut state, mut action) =
            handle_event(TurnState::Idle, TurnEvent::CommandEntered(call));

        loop {
            match action {
                TurnAction::Invoke { call, artifact } => {
                    let event = self.invoke(&call, artifact).await;
                    (state, action) = handle_event(state, event);
                }
                TurnAction::PromptForRedirect { authorization_url } => {
                    println!("\n--- AUTHENTICATION REQUIRED ---");
                    println!("\n1. Open this URL in your browser:\n\n   {authorization_url}\n");
                    println!("2. Sign in and grant permissions.");
                    println!(
                        "3. Copy the ENTIRE URL from your browser's address bar after redirection."
                    );
                    let label = "\n4. Paste the full callback URL here and press Enter:\n> ";
                    let line = read_line(prompt, label).await?.unwrap_or_default();
                    (state, action) = handle_event(state, TurnEvent::RedirectEntered(line));
                }
                TurnAction::PrintResult(value) => {
                    let rendered = serde_json::to_string_pretty(&value)
                        .context("failed to render tool result")?;
                    println!("\nAgent > {rendered}");
                    return Ok(());
                }
                TurnAction::PrintError(message) => {
                    println!("\nAgent > Error: {message}");
                    return Ok(());
                }
                TurnAction::Cancelled => {
                    println!("Authentication cancelled.");
                    return Ok(());
                }
                TurnAction::None => {
                    warn!(?state, "turn ended without a result");
                    return Ok(());
                }
            }
        }
    }

    /// Run one tool invocation and translate its outcome into a turn event.
    async fn invoke(&mut self, call: &ToolCall, artifact: ConsentArtifact) -> TurnEvent {
        let Some(tool) = self.tools.iter().find(|t| t.name() == call.tool) else {
            return TurnEvent::ToolFailed {
                message: format!("no tool named {}", call.tool),
                restart_consent: false,
            };
        };

        debug!(tool = call.tool, resumed = artifact != ConsentArtifact::NoArtifact, "invoking tool");
        let invocation =
            Invocation::new(self.session_key.clone(), call.args.clone()).with_artifact(artifact);

        match tool.invoke(&mut self.cache, invocation).await {
            Ok(ToolOutcome::Pending(signal)) => TurnEvent::ToolSuspended {
                authorization_url: signal.authorization_url().to_owned(),
            },
            Ok(outcome) => TurnEvent::ToolCompleted(outcome.to_json()),
            Err(e) => {
                warn!(tool = call.tool, error = %e, "tool invocation failed");
                TurnEvent::ToolFailed {
                    restart_consent: e.requires_new_consent(),
                    message: e.to_string(),
                }
            }
        }
    }
}

/// Print `label` and read one line; `None` at end of input.
async fn read_line(prompt: &mut Prompt, label: &str) -> Result<Option<String>> {
    print!("{label}");
    std::io::stdout().flush().context("failed to flush stdout")?;
    prompt.next_line().await.context("failed to read from stdin")
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real environment variables win
    dotenvy::dotenv().ok();

    // JSON logs on stderr; LOG_LEVEL / RUST_LOG, quiet by default so the prompt stays readable
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    let prometheus = metrics::install_recorder()?;

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    let config = Config::load(config_path.as_deref()).with_context(|| match &config_path {
        Some(path) => format!("failed to load config from {}", path.display()),
        None => "failed to load config (set GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET)".to_owned(),
    })?;

    info!(
        config_file = ?config_path,
        redirect_uri = %config.google.redirect_uri,
        chat_base_url = %config.chat.base_url,
        message_limit = config.chat.message_limit,
        "configuration loaded"
    );

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.chat.timeout_secs))
        .build()
        .context("failed to build HTTP client")?;

    let endpoint = GoogleTokenEndpoint::new(
        http.clone(),
        &config.google.token_url,
        config.client_id.clone(),
        config.client_secret.clone(),
        &config.google.redirect_uri,
    );
    let emitter = ConsentEmitter::new(
        &config.google.authorize_url,
        config.client_id.clone(),
        &config.google.redirect_uri,
    );
    let resolver = Arc::new(Resolver::new(Arc::new(endpoint), emitter));
    let chat = ChatClient::new(http, &config.chat.base_url, config.chat.message_limit);

    let mut agent = Agent {
        tools: vec![
            Box::new(SearchSpacesTool::new(resolver.clone(), chat.clone())) as Box<dyn Tool>,
            Box::new(ListMessagesTool::new(resolver, chat)),
        ],
        cache: CredentialCache::new(),
        session_key: SessionKey::new(format!("cli-user-{}", uuid::Uuid::new_v4())),
        prometheus,
    };
    info!(session = %agent.session_key, tools = agent.tools.len(), "session started");

    println!("--- Google Chat Agent Initialized (Local CLI) ---");
    println!("Type 'help' for commands, 'exit' or 'quit' to end.");

    let mut prompt = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(line) = read_line(&mut prompt, "\nYou > ").await? else {
            break;
        };

        let command = match commands::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        metrics::record_command(command.label());

        match command {
            Command::Exit => break,
            Command::Help => println!("{HELP}"),
            Command::Stats => println!("{}", metrics::render_stats(&agent.prometheus)),
            Command::Tool(call) => agent.run_turn(call, &mut prompt).await?,
        }
    }

    println!("Ending session. Goodbye!");
    info!(session = %agent.session_key, cached_sessions = agent.cache.len(), "session ended");
    Ok(())
}
