//! Prompt input parsing
//!
//! The interpreter stands in for a conversational model: each line maps to at
//! most one tool call.

use chat_tools::{ListMessagesTool, SearchSpacesTool};
use serde_json::{Value, json};

use crate::error::{Error, Result};

pub const HELP: &str = "\
Commands:
  spaces <query>               search your Chat spaces by display name
  messages <space> [filter]    list recent messages (space: spaces/ID or ID)
  stats                        show credential metrics
  help                         show this list
  exit | quit                  end the session";

/// A request to run one tool with JSON arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub tool: &'static str,
    pub args: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Tool(ToolCall),
    Stats,
    Help,
    Exit,
}

impl Command {
    /// Label for the commands counter.
    pub fn label(&self) -> &'static str {
        match self {
            Command::Tool(call) => call.tool,
            Command::Stats => "stats",
            Command::Help => "help",
            Command::Exit => "exit",
        }
    }
}

/// Parse one prompt line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_lowercase().as_str() {
        "exit" | "quit" => Command::Exit,
        "help" | "?" => Command::Help,
        "stats" => Command::Stats,
        "spaces" => Command::Tool(ToolCall {
            tool: SearchSpacesTool::NAME,
            args: json!({"display_name_query": rest}),
        }),
        "messages" => {
            let (space, filter) = match rest.split_once(char::is_whitespace) {
                Some((space, filter)) => (space, filter.trim()),
                None => (rest, ""),
            };
            if space.is_empty() {
                return Err(Error::MissingArgument {
                    command: "messages",
                    argument: "space name",
                });
            }
            let mut args = json!({"parent": space_name(space)});
            if !filter.is_empty() {
                args["filter"] = json!(filter);
            }
            Command::Tool(ToolCall {
                tool: ListMessagesTool::NAME,
                args,
            })
        }
        _ => return Err(Error::UnknownCommand(word.to_owned())),
    };
    Ok(Some(command))
}

/// Accept bare space ids as well as `spaces/{id}`.
fn space_name(space: &str) -> String {
    if space.starts_with("spaces/") {
        space.to_owned()
    } else {
        format!("spaces/{space}")
    }
}
