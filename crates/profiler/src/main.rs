use anyhow::Result;
use std::path::Path;

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let config = common::config::Config::load()?;

    let (dispatch, _otel_guard) =
        common::observability::build_dispatch("profiler", &config.general.log_level);
    tracing::dispatcher::set_global_default(dispatch).map_err(anyhow::Error::msg)?;

    let cmd = cli::parse_args(std::env::args()).map_err(anyhow::Error::msg)?;

    profiler::metrics::describe();
    let ctx = profiler::ProfilerContext::from_config(&config)?;
    cli::run_command(&ctx, Path::new(&config.report.output_dir), cmd).await
}
