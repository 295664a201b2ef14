//! Configuration types and loading
//!
//! Precedence: env vars > config file > defaults. The file is optional; the
//! OAuth client id and secret come only from the environment (or `.env`) so
//! they never sit in the TOML.

use common::Secret;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory.
const DEFAULT_CONFIG_FILE: &str = "chat-agent.toml";

/// Root configuration
#[derive(Debug)]
pub struct Config {
    pub google: GoogleConfig,
    pub chat: ChatConfig,
    pub client_id: Secret<String>,
    pub client_secret: Secret<String>,
}

/// TOML file layout
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    google: GoogleConfig,
    chat: ChatConfig,
}

/// OAuth endpoints for the desktop client
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GoogleConfig {
    pub redirect_uri: String,
    pub authorize_url: String,
    pub token_url: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            redirect_uri: google_auth::DEFAULT_REDIRECT_URI.into(),
            authorize_url: google_auth::AUTHORIZE_ENDPOINT.into(),
            token_url: google_auth::TOKEN_ENDPOINT.into(),
        }
    }
}

/// Chat API client settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChatConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Cap on messages returned by one `list_space_messages` call
    pub message_limit: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: chat_tools::DEFAULT_BASE_URL.into(),
            timeout_secs: 30,
            message_limit: chat_tools::DEFAULT_MESSAGE_LIMIT,
        }
    }
}

impl Config {
    /// Load the optional TOML file, overlay environment variables, read the
    /// client secrets, and validate.
    pub fn load(path: Option<&Path>) -> common::Result<Self> {
        let mut file = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)?;
                toml::from_str::<FileConfig>(&contents)?
            }
            None => FileConfig::default(),
        };
        apply_env(&mut file)?;

        let config = Config {
            google: file.google,
            chat: file.chat,
            client_id: Secret::from_env("GOOGLE_CLIENT_ID")?,
            client_secret: Secret::from_env("GOOGLE_CLIENT_SECRET")?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        for (name, value) in [
            ("google.redirect_uri", &self.google.redirect_uri),
            ("google.authorize_url", &self.google.authorize_url),
            ("google.token_url", &self.google.token_url),
            ("chat.base_url", &self.chat.base_url),
        ] {
            if !value.starts_with("http://") && !value.starts_with("https://") {
                return Err(common::Error::Config(format!(
                    "{name} must start with http:// or https://, got: {value}"
                )));
            }
        }

        if self.chat.timeout_secs == 0 {
            return Err(common::Error::Config(
                "chat.timeout_secs must be greater than 0".into(),
            ));
        }

        if self.chat.message_limit == 0 {
            return Err(common::Error::Config(
                "chat.message_limit must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Resolve the config file from the CLI arg, then CONFIG_PATH, then
    /// `chat-agent.toml` in the working directory if it exists.
    pub fn resolve_path(cli_path: Option<&str>) -> Option<PathBuf> {
        if let Some(p) = cli_path {
            return Some(PathBuf::from(p));
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return Some(PathBuf::from(p));
        }
        let default = PathBuf::from(DEFAULT_CONFIG_FILE);
        default.exists().then_some(default)
    }
}

/// Non-secret overrides from the environment.
fn apply_env(file: &mut FileConfig) -> common::Result<()> {
    if let Ok(uri) = std::env::var("GOOGLE_REDIRECT_URI") {
        file.google.redirect_uri = uri;
    }
    if let Ok(url) = std::env::var("CHAT_API_BASE_URL") {
        file.chat.base_url = url;
    }
    if let Ok(limit) = std::env::var("CHAT_MESSAGE_LIMIT") {
        file.chat.message_limit = limit.trim().parse().map_err(|e| {
            common::Error::Config(format!("CHAT_MESSAGE_LIMIT must be a number, got {limit:?}: {e}"))
        })?;
    }
    Ok(())
}
