//! Error types for tool invocations

use crate::chat::ChatError;

/// Failures a tool cannot turn into a JSON result.
///
/// Google API rejections are not here: tools report those as
/// `{"status": "error", ...}` results so the caller can show them.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Credentials(#[from] credential_flow::Error),

    #[error("chat request failed: {0}")]
    Chat(#[from] ChatError),
}

impl ToolError {
    /// True when the caller should start the consent step over.
    pub fn requires_new_consent(&self) -> bool {
        matches!(self, ToolError::Credentials(e) if e.requires_new_consent())
    }
}

/// Result alias for tool invocations.
pub type Result<T> = std::result::Result<T, ToolError>;
