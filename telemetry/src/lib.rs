//! Tracing initialization shared by the pipeline binaries.

use std::sync::Once;

use config::Environment;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter applied when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "info";

/// Environment variable enabling log output in tests.
const ENABLE_TEST_TRACING_VAR: &str = "ENABLE_TRACING";

static INIT_TEST_TRACING: Once = Once::new();

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to load the runtime environment: {0}")]
    Environment(#[from] std::io::Error),
    #[error("failed to redirect `log` records to tracing: {0}")]
    LogTracer(#[from] tracing_log::log::SetLoggerError),
    #[error("failed to install the global tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Flushes buffered log lines when dropped.
///
/// Keep it alive until the end of `main`, otherwise records written right before exit are lost.
#[must_use]
pub struct LogFlusher {
    _guard: Option<WorkerGuard>,
}

/// Installs the global tracing subscriber for `app_name`.
///
/// In [`Environment::Dev`] logs are printed in a human readable format. In
/// [`Environment::Prod`] logs are emitted as JSON through a non-blocking writer. `log` records
/// from dependencies are forwarded to tracing in both cases.
pub fn init_tracing(app_name: &str) -> Result<LogFlusher, TracingError> {
    let environment = Environment::load()?;

    tracing_log::LogTracer::init()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match environment {
        Environment::Dev => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_target(true))
                .try_init()?;

            tracing::info!(app = app_name, environment = %environment, "tracing initialized");

            Ok(LogFlusher { _guard: None })
        }
        Environment::Prod => {
            let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());

            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_writer(writer),
                )
                .try_init()?;

            tracing::info!(app = app_name, environment = %environment, "tracing initialized");

            Ok(LogFlusher {
                _guard: Some(guard),
            })
        }
    }
}

/// Installs a test-friendly subscriber once per process.
///
/// Output is only produced when `ENABLE_TRACING` is set, so test runs stay quiet by default.
pub fn init_test_tracing() {
    INIT_TEST_TRACING.call_once(|| {
        if std::env::var(ENABLE_TEST_TRACING_VAR).is_err() {
            return;
        }

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}
