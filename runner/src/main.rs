//! Pipeline runner binary.
//!
//! Loads seeds into DuckDB, runs the transform, SQL and export models in order and exits with a
//! non-zero status when any step fails.

use std::process::ExitCode;

use ::config::shared::RunnerConfig;
use tracing::{error, info};

use crate::config::load_runner_config;
use crate::core::run_pipeline;
use crate::error::{RunnerError, RunnerResult};

mod config;
mod core;
mod error;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprint!("{}", err.render_report());
            ExitCode::FAILURE
        }
    }
}

fn run() -> RunnerResult<()> {
    let runner_config = load_runner_config()?;

    let _log_flusher =
        telemetry::init_tracing(env!("CARGO_BIN_NAME")).map_err(RunnerError::config)?;

    install_crypto_provider()?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(runner_config))
}

async fn async_main(runner_config: RunnerConfig) -> RunnerResult<()> {
    if let Err(err) = run_pipeline(runner_config).await {
        error!("{err}");
        return Err(err.into());
    }

    info!("pipeline run completed");

    Ok(())
}

/// Selects aws-lc-rs as the process-wide rustls provider for TLS connections to Postgres.
fn install_crypto_provider() -> RunnerResult<()> {
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| RunnerError::config(error::CryptoProviderAlreadyInstalled))
}
