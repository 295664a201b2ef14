//! Google OAuth endpoints and Chat API scopes
//!
//! The client id and secret are not constants: they identify the user's own
//! Google Cloud project and are loaded from the environment at startup.

/// Authorization endpoint for the browser consent step
pub const AUTHORIZE_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/auth";

/// Token endpoint for code exchange and token refresh
pub const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Redirect URI registered for the desktop client. Nothing listens on it;
/// the user copies the resulting address bar URL back into the CLI.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8000/callback";

/// Read-only access to the spaces the user belongs to
pub const SCOPE_SPACES_READONLY: &str = "https://www.googleapis.com/auth/chat.spaces.readonly";

/// Read-only access to messages in those spaces
pub const SCOPE_MESSAGES_READONLY: &str =
    "https://www.googleapis.com/auth/chat.messages.readonly";

/// Refresh tokens this close to expiry so a paginated Chat call does not
/// run into a 401 halfway through (60 seconds)
pub const REFRESH_THRESHOLD_MILLIS: u64 = 60_000;
