use anyhow::Result;
use metrics::describe_gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub fn describe() {
    describe_gauge!(
        "persona_web_build_info",
        "Build info for the wallet persona service (value is always 1)."
    );
    profiler::metrics::describe();
}

/// Install a global Prometheus recorder once and return a handle for rendering `/metrics`.
///
/// Upkeep runs on each `/metrics` request.
pub fn init_global() -> Result<PrometheusHandle> {
    let handle = match PROM_HANDLE.get() {
        Some(handle) => handle.clone(),
        None => {
            let handle = PrometheusBuilder::new().install_recorder()?;
            describe();
            PROM_HANDLE.get_or_init(|| handle).clone()
        }
    };

    let git_sha = std::env::var("GIT_SHA").unwrap_or_else(|_| "unknown".to_string());
    ::metrics::gauge!(
        "persona_web_build_info",
        "version" => env!("CARGO_PKG_VERSION"),
        "git_sha" => git_sha,
    )
    .set(1.0);

    Ok(handle)
}
