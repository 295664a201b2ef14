//! Prometheus metrics for the interactive session
//!
//! The credential-flow crate emits `credential_resolutions_total` and
//! `token_refresh_failures_total`; this binary adds:
//!
//! - `agent_commands_total` (counter): label `command`
//!
//! There is no listener. The `stats` command prints the rendered text.

use anyhow::Context;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder and return a handle for rendering.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")
}

/// Record one command entered at the prompt.
pub fn record_command(command: &'static str) {
    metrics::counter!("agent_commands_total", "command" => command).increment(1);
}

/// Rendered metrics, or a note when nothing has been recorded yet.
pub fn render_stats(handle: &PrometheusHandle) -> String {
    let rendered = handle.render();
    if rendered.trim().is_empty() {
        "no metrics recorded yet".to_owned()
    } else {
        rendered
    }
}
