use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;

use etl::error::EtlError;
use thiserror::Error;

/// Returns whether terminal output should include backtraces.
fn should_render_backtrace() -> bool {
    matches!(
        std::env::var("RUST_BACKTRACE").as_deref(),
        Ok("1") | Ok("full")
    )
}

/// Result type for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Raised when another rustls crypto provider was installed before ours.
#[derive(Debug, Error)]
#[error("a rustls crypto provider is already installed")]
pub struct CryptoProviderAlreadyInstalled;

/// Captured backtrace for the non-pipeline variants of [`RunnerError`].
pub struct CapturedBacktrace(Backtrace);

impl CapturedBacktrace {
    fn capture() -> Self {
        Self(Backtrace::capture())
    }
}

impl fmt::Debug for CapturedBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for the runner binary.
#[derive(Debug)]
pub enum RunnerError {
    /// A seed or model failed.
    Etl(EtlError),
    /// Configuration could not be loaded or is invalid, or startup failed.
    Config(Box<dyn Error + Send + Sync>, CapturedBacktrace),
    /// The async runtime could not be started.
    Io(std::io::Error, CapturedBacktrace),
}

impl RunnerError {
    /// Returns a short category label for this error.
    pub fn category(&self) -> &'static str {
        match self {
            RunnerError::Etl(_) => "pipeline error",
            RunnerError::Config(_, _) => "configuration error",
            RunnerError::Io(_, _) => "i/o error",
        }
    }

    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self {
            RunnerError::Etl(err) => err.backtrace(),
            RunnerError::Config(_, cb) => Some(&cb.0),
            RunnerError::Io(_, cb) => Some(&cb.0),
        }
    }

    /// Creates a configuration error from any error.
    pub fn config<E: Error + Send + Sync + 'static>(err: E) -> Self {
        RunnerError::Config(Box::new(err), CapturedBacktrace::capture())
    }

    /// Returns a user-oriented report for terminal output.
    ///
    /// Aggregated pipeline errors already list their members, so their causes are not repeated.
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        out.push_str("runner failed\n");
        out.push_str(&format!("category: {}\n", self.category()));
        out.push_str(&format!("error: {self}\n"));

        let aggregated = matches!(self, RunnerError::Etl(err) if err.errors().is_some());
        if !aggregated {
            let mut source = Error::source(self);
            let mut idx = 1usize;
            while let Some(err) = source {
                out.push_str(&format!("cause {idx}: {err}\n"));
                source = err.source();
                idx += 1;
            }
        }

        if should_render_backtrace() {
            if let Some(backtrace) = self.backtrace() {
                out.push_str("backtrace:\n");
                out.push_str(&backtrace.to_string());
                if !out.ends_with('\n') {
                    out.push('\n');
                }
            }
        }

        out
    }
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerError::Etl(err) => write!(f, "{err}"),
            RunnerError::Config(source, _) => write!(f, "configuration error: {source}"),
            RunnerError::Io(source, _) => write!(f, "i/o error: {source}"),
        }
    }
}

impl Error for RunnerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RunnerError::Etl(err) => err.source(),
            RunnerError::Config(source, _) => Some(source.as_ref()),
            RunnerError::Io(source, _) => Some(source),
        }
    }
}

impl From<std::io::Error> for RunnerError {
    fn from(err: std::io::Error) -> Self {
        RunnerError::Io(err, CapturedBacktrace::capture())
    }
}

impl From<EtlError> for RunnerError {
    fn from(err: EtlError) -> Self {
        RunnerError::Etl(err)
    }
}

#[cfg(test)]
mod tests {
    use etl::error::ErrorKind;
    use etl::etl_error;

    use super::*;

    #[test]
    fn test_report_lists_causes() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "seed missing");
        let err = RunnerError::from(EtlError::from(io));

        let report = err.render_report();

        assert!(report.starts_with("runner failed\ncategory: pipeline error\n"));
        assert!(report.contains("cause 1: seed missing\n"));
    }

    #[test]
    fn test_report_skips_causes_of_aggregated_errors() {
        let err = RunnerError::from(EtlError::from(vec![
            etl_error!(ErrorKind::SessionQueryFailed, "Insert failed"),
            etl_error!(ErrorKind::InvalidState, "Rollback failed"),
        ]));

        let report = err.render_report();

        assert!(report.contains("[Many] 2 errors aggregated"));
        assert!(!report.contains("cause 1:"));
    }

    #[test]
    fn test_config_category() {
        let err = RunnerError::config(CryptoProviderAlreadyInstalled);

        assert_eq!(err.category(), "configuration error");
        assert!(err.to_string().contains("already installed"));
    }
}
