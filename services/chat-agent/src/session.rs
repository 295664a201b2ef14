//! Turn state machine
//!
//! Pure state machine: receives events, returns (new_state, action).
//! Caller (main.rs) executes the I/O implied by each action: invoking a tool,
//! printing, or reading the redirect URL from the prompt.

use credential_flow::{ConsentArtifact, ConsentResponse};
use serde_json::Value;

use crate::commands::ToolCall;

/// Printed when the consent redirect could not be exchanged.
pub const RESTART_CONSENT: &str = "please restart the authentication step";

/// Turn states
#[derive(Debug, Clone, PartialEq)]
pub enum TurnState {
    /// Waiting for a command
    Idle,
    /// A tool call is in flight
    Invoking { call: ToolCall },
    /// The tool suspended; waiting for the user to paste the redirect URL
    AwaitingConsent { call: ToolCall },
}

/// Events that drive state transitions
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    /// User entered a tool command
    CommandEntered(ToolCall),
    /// Tool finished with a JSON result
    ToolCompleted(Value),
    /// Tool needs consent before it can run
    ToolSuspended { authorization_url: String },
    /// Tool returned an error
    ToolFailed {
        message: String,
        restart_consent: bool,
    },
    /// Line entered at the redirect prompt
    RedirectEntered(String),
}

/// Actions the caller should execute after a state transition
#[derive(Debug, Clone, PartialEq)]
pub enum TurnAction {
    /// Run the tool, attaching `artifact`
    Invoke {
        call: ToolCall,
        artifact: ConsentArtifact,
    },
    /// Show the consent URL and read the redirect URL
    PromptForRedirect { authorization_url: String },
    /// Print the tool result; turn over
    PrintResult(Value),
    /// Print an error; turn over
    PrintError(String),
    /// User declined to paste a redirect; turn over
    Cancelled,
    /// No-op
    None,
}

/// Handle a state transition. Pure function: no I/O.
pub fn handle_event(state: TurnState, event: TurnEvent) -> (TurnState, TurnAction) {
    match (state, event) {
        // --- Idle ---
        (TurnState::Idle, TurnEvent::CommandEntered(call)) => (
            TurnState::Invoking { call: call.clone() },
            TurnAction::Invoke {
                call,
                artifact: ConsentArtifact::NoArtifact,
            },
        ),

        // --- Invoking ---
        (TurnState::Invoking { .. }, TurnEvent::ToolCompleted(value)) => {
            (TurnState::Idle, TurnAction::PrintResult(value))
        }

        (TurnState::Invoking { call }, TurnEvent::ToolSuspended { authorization_url }) => (
            TurnState::AwaitingConsent { call },
            TurnAction::PromptForRedirect { authorization_url },
        ),

        (
            TurnState::Invoking { .. },
            TurnEvent::ToolFailed {
                message,
                restart_consent,
            },
        ) => {
            let message = if restart_consent {
                format!("{message}; {RESTART_CONSENT}")
            } else {
                message
            };
            (TurnState::Idle, TurnAction::PrintError(message))
        }

        // --- AwaitingConsent ---
        (TurnState::AwaitingConsent { call }, TurnEvent::RedirectEntered(line)) => {
            let redirect = line.trim();
            if redirect.is_empty() {
                return (TurnState::Idle, TurnAction::Cancelled);
            }
            let artifact = ConsentArtifact::ConsentResponse(ConsentResponse::new(redirect));
            (
                TurnState::Invoking { call: call.clone() },
                TurnAction::Invoke { call, artifact },
            )
        }

        // --- Catch-all: ignore invalid transitions ---
        (state, _) => (state, TurnAction::None),
    }
}
