//! Google Chat REST client
//!
//! Only the two listing calls the tools need. Pagination cursors are consumed
//! here and never leave the client.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

/// Chat API v1 root.
pub const DEFAULT_BASE_URL: &str = "https://chat.googleapis.com/v1";

/// Messages returned per `list_messages` call unless configured otherwise.
pub const DEFAULT_MESSAGE_LIMIT: usize = 500;

/// Largest page the Chat API accepts.
const MAX_PAGE_SIZE: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Google answered with a non-success status.
    #[error("chat API returned {status}: {reason}")]
    Api { status: u16, reason: String },

    #[error("chat API request failed: {0}")]
    Http(String),

    #[error("unexpected chat API response: {0}")]
    Decode(String),

    #[error("invalid chat API URL: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sender {
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub sender: Option<Sender>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub create_time: Option<String>,
}

impl Message {
    pub fn author(&self) -> Option<&str> {
        self.sender.as_ref().and_then(|s| s.display_name.as_deref())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpacesPage {
    #[serde(default)]
    spaces: Vec<Space>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagesPage {
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Google's JSON error envelope: `{"error": {"code", "message", "status"}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Thin wrapper over `reqwest::Client` bound to a Chat API root.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    message_limit: usize,
}

impl ChatClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, message_limit: usize) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            message_limit,
        }
    }

    /// Every space visible to the user, across all pages.
    pub async fn list_spaces(&self, access_token: &str) -> Result<Vec<Space>, ChatError> {
        let mut spaces = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.endpoint("spaces")?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", &MAX_PAGE_SIZE.to_string());
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let page: SpacesPage = self.get_page(url, access_token).await?;
            debug!(fetched = page.spaces.len(), "spaces page received");
            spaces.extend(page.spaces);

            page_token = page.next_page_token.filter(|t| !t.is_empty());
            if page_token.is_none() {
                break;
            }
        }

        Ok(spaces)
    }

    /// Newest-first messages in `parent` (`spaces/{id}`), capped at the
    /// configured limit. `filter` uses the Chat API filter syntax.
    pub async fn list_messages(
        &self,
        access_token: &str,
        parent: &str,
        filter: Option<&str>,
    ) -> Result<Vec<Message>, ChatError> {
        let mut messages = Vec::new();
        let mut page_token: Option<String> = None;

        while messages.len() < self.message_limit {
            let page_size = (self.message_limit - messages.len()).min(MAX_PAGE_SIZE);
            let mut url = self.endpoint(&format!("{parent}/messages"))?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", &page_size.to_string());
                query.append_pair("orderBy", "createTime DESC");
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
                if let Some(filter) = filter {
                    query.append_pair("filter", filter);
                }
            }

            let page: MessagesPage = self.get_page(url, access_token).await?;
            debug!(parent, fetched = page.messages.len(), "messages page received");
            messages.extend(page.messages);

            page_token = page.next_page_token.filter(|t| !t.is_empty());
            if page_token.is_none() {
                break;
            }
        }

        messages.truncate(self.message_limit);
        Ok(messages)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ChatError> {
        let raw = format!("{}/{path}", self.base_url);
        Url::parse(&raw).map_err(|e| ChatError::InvalidUrl(format!("{raw}: {e}")))
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        url: Url,
        access_token: &str,
    ) -> Result<T, ChatError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ChatError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            let reason = error_reason(status, &body);
            warn!(status = status.as_u16(), reason = %reason, "chat API request rejected");
            return Err(ChatError::Api {
                status: status.as_u16(),
                reason,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ChatError::Decode(e.to_string()))
    }
}

/// Human-readable reason for a failed call: Google's `error.message`, then
/// its `error.status`, then the HTTP reason phrase.
fn error_reason(status: reqwest::StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<ErrorEnvelope>(body).ok().map(|e| e.error);
    detail
        .and_then(|d| d.message.filter(|m| !m.is_empty()).or(d.status))
        .or_else(|| status.canonical_reason().map(str::to_owned))
        .unwrap_or_else(|| status.as_u16().to_string())
}
