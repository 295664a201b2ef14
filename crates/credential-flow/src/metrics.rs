//! Resolution counters
//!
//! - `credential_resolutions_total` (counter): label `outcome`
//! - `token_refresh_failures_total` (counter)
//!
//! Without an installed recorder these calls are no-ops.

/// How a resolution finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Unexpired cached bundle
    Cached,
    /// Expired bundle renewed with its refresh token
    Refreshed,
    /// Consent response exchanged for a new bundle
    Exchanged,
    /// Consent requested, invocation suspended
    Suspended,
    /// Resolution returned an error
    Failed,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Cached => "cached",
            Outcome::Refreshed => "refreshed",
            Outcome::Exchanged => "exchanged",
            Outcome::Suspended => "suspended",
            Outcome::Failed => "failed",
        }
    }
}

pub fn record_resolution(outcome: Outcome) {
    metrics::counter!("credential_resolutions_total", "outcome" => outcome.label()).increment(1);
}

pub fn record_refresh_failure() {
    metrics::counter!("token_refresh_failures_total").increment(1);
}
