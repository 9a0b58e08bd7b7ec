//! Error types and result definitions for pipeline operations.
//!
//! [`EtlError`] carries a classification ([`ErrorKind`]), a static description, optional dynamic
//! detail, the originating error as its source and the callsite location. Several errors can be
//! aggregated into one, which is how a failed rollback is reported next to the failure that
//! caused it.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use postgres::client::PgConnectError;

/// Result type for pipeline operations using [`EtlError`] as the error type.
pub type EtlResult<T> = Result<T, EtlError>;

/// Payload stored for single [`EtlError`] instances.
#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

/// Main error type for pipeline operations.
#[derive(Debug, Clone)]
pub struct EtlError {
    repr: ErrorRepr,
}

/// Internal representation of error data.
#[derive(Debug, Clone)]
enum ErrorRepr {
    /// Single error payload holding rich metadata.
    Single(ErrorPayload),
    /// Multiple aggregated errors.
    Many {
        errors: Vec<EtlError>,
        location: &'static Location<'static>,
    },
}

/// Categories of errors that can occur while running models and exporting datasets.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Connection Errors
    SessionConnectionFailed,
    DestinationConnectionFailed,

    // Query & Execution Errors
    SessionQueryFailed,
    DestinationQueryFailed,
    DestinationOperationCanceled,

    // Schema & Mapping Errors
    MissingColumn,
    InvalidColumnType,
    DatasetShapeMismatch,
    MissingDataset,
    DestinationSchemaError,
    DestinationTableAlreadyExists,

    // Data & Transformation Errors
    ConversionError,
    InvalidData,
    ValidationError,

    // Configuration Errors
    ConfigError,

    // IO Errors
    IoError,
    DestinationIoError,

    // Security & Authentication Errors
    EncryptionError,
    AuthenticationError,
    PermissionDenied,

    // State Errors
    InvalidState,
    SessionTaskPanic,

    // General Errors
    SessionError,
    DestinationError,

    // Unknown / Uncategorized
    Unknown,
}

impl EtlError {
    /// Returns the [`ErrorKind`] of this error.
    ///
    /// For aggregated errors, returns the kind of the first error or [`ErrorKind::Unknown`] if the
    /// list is empty.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.kind,
            ErrorRepr::Many { ref errors, .. } => errors
                .first()
                .map(|err| err.kind())
                .unwrap_or(ErrorKind::Unknown),
        }
    }

    /// Returns all [`ErrorKind`]s present in this error, flattening aggregates.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match self.repr {
            ErrorRepr::Single(ref payload) => vec![payload.kind],
            ErrorRepr::Many { ref errors, .. } => {
                errors.iter().flat_map(|err| err.kinds()).collect()
            }
        }
    }

    /// Returns the static description, or `None` for aggregated errors.
    pub fn description(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::Single(ref payload) => Some(payload.description.as_ref()),
            ErrorRepr::Many { .. } => None,
        }
    }

    /// Returns the dynamic detail if available.
    ///
    /// For aggregated errors, returns the detail of the first error that has one.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.detail.as_deref(),
            ErrorRepr::Many { ref errors, .. } => errors.iter().find_map(|e| e.detail()),
        }
    }

    /// Returns the aggregated errors, or `None` for a single error.
    pub fn errors(&self) -> Option<&[EtlError]> {
        match self.repr {
            ErrorRepr::Single(_) => None,
            ErrorRepr::Many { ref errors, .. } => Some(errors),
        }
    }

    /// Returns the captured backtrace for this error.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self.repr {
            ErrorRepr::Single(ref payload) => Some(payload.backtrace.as_ref()),
            ErrorRepr::Many { .. } => None,
        }
    }

    /// Returns the captured callsite location for this error.
    pub fn location(&self) -> &'static Location<'static> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.location,
            ErrorRepr::Many { location, .. } => location,
        }
    }

    /// Attaches an originating error, exposed through [`error::Error::source`].
    ///
    /// Has no effect on aggregated errors, which forward their first error as the source.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        if let ErrorRepr::Single(ref mut payload) = self.repr {
            payload.source = Some(Arc::new(source));
        }
        self
    }

    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        EtlError {
            repr: ErrorRepr::Single(ErrorPayload {
                kind,
                description,
                detail,
                source,
                location: Location::caller(),
                backtrace: Arc::new(Backtrace::capture()),
            }),
        }
    }

    /// Builds an error of `kind` that wraps `err`, using its message as the detail.
    #[track_caller]
    fn wrap<E>(kind: ErrorKind, description: &'static str, err: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        let detail = err.to_string();
        EtlError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

impl PartialEq for EtlError {
    fn eq(&self, other: &EtlError) -> bool {
        match (&self.repr, &other.repr) {
            (ErrorRepr::Single(a), ErrorRepr::Single(b)) => a.kind == b.kind,
            (ErrorRepr::Many { errors: a, .. }, ErrorRepr::Many { errors: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for EtlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match &self.repr {
            ErrorRepr::Single(payload) => {
                let location = payload.location;
                write!(
                    f,
                    "[{:?}] {} @ {}:{}:{}",
                    payload.kind,
                    payload.description,
                    location.file(),
                    location.line(),
                    location.column()
                )?;

                if let Some(detail) = payload.detail.as_deref() {
                    write!(f, "\n  Detail:")?;
                    for line in detail.lines() {
                        write!(f, "\n    {line}")?;
                    }
                }

                Ok(())
            }
            ErrorRepr::Many { errors, location } => {
                let count = errors.len();
                write!(
                    f,
                    "[Many] {} error{} aggregated @ {}:{}:{}",
                    count,
                    if count == 1 { "" } else { "s" },
                    location.file(),
                    location.line(),
                    location.column()
                )?;

                for (index, error) in errors.iter().enumerate() {
                    let rendered = error.to_string();
                    let mut lines = rendered.lines();
                    if let Some(first_line) = lines.next() {
                        write!(f, "\n  {}. {}", index + 1, first_line)?;
                    }
                    for line in lines {
                        write!(f, "\n     {line}")?;
                    }
                }

                Ok(())
            }
        }
    }
}

impl error::Error for EtlError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.repr {
            ErrorRepr::Single(payload) => payload
                .source
                .as_ref()
                .map(|source| source as &(dyn error::Error + 'static)),
            ErrorRepr::Many { errors, .. } => errors
                .first()
                .map(|error| error as &(dyn error::Error + 'static)),
        }
    }
}

/// Creates an [`EtlError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for EtlError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> EtlError {
        EtlError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates an [`EtlError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for EtlError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> EtlError {
        EtlError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Aggregates a vector of errors. A single error is returned as is.
impl<E> From<Vec<E>> for EtlError
where
    E: Into<EtlError>,
{
    #[track_caller]
    fn from(errors: Vec<E>) -> EtlError {
        let location = Location::caller();

        let mut errors: Vec<EtlError> = errors.into_iter().map(Into::into).collect();

        if errors.len() == 1 {
            return errors.pop().expect("just checked length is 1");
        }

        EtlError {
            repr: ErrorRepr::Many { errors, location },
        }
    }
}

impl From<std::io::Error> for EtlError {
    #[track_caller]
    fn from(err: std::io::Error) -> EtlError {
        EtlError::wrap(ErrorKind::IoError, "I/O operation failed", err)
    }
}

impl From<chrono::ParseError> for EtlError {
    #[track_caller]
    fn from(err: chrono::ParseError) -> EtlError {
        EtlError::wrap(ErrorKind::ConversionError, "Datetime parsing failed", err)
    }
}

impl From<config::shared::ValidationError> for EtlError {
    #[track_caller]
    fn from(err: config::shared::ValidationError) -> EtlError {
        EtlError::wrap(ErrorKind::ConfigError, "Invalid configuration", err)
    }
}

/// Converts [`duckdb::Error`] to [`EtlError`].
///
/// Errors raised by the attached Postgres database surface here too, since the bridge statements
/// run through the DuckDB session.
impl From<duckdb::Error> for EtlError {
    #[track_caller]
    fn from(err: duckdb::Error) -> EtlError {
        let (kind, description) = match &err {
            duckdb::Error::InvalidPath(_) => {
                (ErrorKind::SessionConnectionFailed, "DuckDB database could not be opened")
            }
            duckdb::Error::InvalidColumnIndex(_)
            | duckdb::Error::InvalidColumnName(_)
            | duckdb::Error::InvalidColumnType(..) => {
                (ErrorKind::DatasetShapeMismatch, "DuckDB result shape mismatch")
            }
            duckdb::Error::FromSqlConversionFailure(..)
            | duckdb::Error::ToSqlConversionFailure(_)
            | duckdb::Error::IntegralValueOutOfRange(..) => {
                (ErrorKind::ConversionError, "DuckDB value conversion failed")
            }
            _ => (ErrorKind::SessionQueryFailed, "DuckDB statement failed"),
        };

        EtlError::wrap(kind, description, err)
    }
}

impl From<rustls::Error> for EtlError {
    #[track_caller]
    fn from(err: rustls::Error) -> EtlError {
        EtlError::wrap(ErrorKind::EncryptionError, "TLS configuration failed", err)
    }
}

impl From<PgConnectError> for EtlError {
    #[track_caller]
    fn from(err: PgConnectError) -> EtlError {
        match err {
            PgConnectError::Postgres(err) => match err.code() {
                Some(_) => EtlError::from(err),
                None => EtlError::wrap(
                    ErrorKind::DestinationConnectionFailed,
                    "PostgreSQL connection failed",
                    err,
                ),
            },
            PgConnectError::Certificates(err) => EtlError::wrap(
                ErrorKind::ConfigError,
                "Trusted root certificates could not be read",
                err,
            ),
            PgConnectError::Tls(err) => EtlError::from(err),
        }
    }
}

/// Converts [`tokio_postgres::Error`] to [`EtlError`] based on its SQLSTATE code.
impl From<tokio_postgres::Error> for EtlError {
    #[track_caller]
    fn from(err: tokio_postgres::Error) -> EtlError {
        let (kind, description) = match err.code() {
            Some(sqlstate) => {
                use tokio_postgres::error::SqlState;

                match *sqlstate {
                    // Connection errors (08xxx, 3D000)
                    SqlState::CONNECTION_EXCEPTION
                    | SqlState::CONNECTION_DOES_NOT_EXIST
                    | SqlState::CONNECTION_FAILURE
                    | SqlState::SQLCLIENT_UNABLE_TO_ESTABLISH_SQLCONNECTION
                    | SqlState::SQLSERVER_REJECTED_ESTABLISHMENT_OF_SQLCONNECTION
                    | SqlState::TOO_MANY_CONNECTIONS
                    | SqlState::CANNOT_CONNECT_NOW
                    | SqlState::INVALID_CATALOG_NAME => (
                        ErrorKind::DestinationConnectionFailed,
                        "PostgreSQL connection failed",
                    ),

                    // Authentication errors (28xxx)
                    SqlState::INVALID_AUTHORIZATION_SPECIFICATION | SqlState::INVALID_PASSWORD => (
                        ErrorKind::AuthenticationError,
                        "PostgreSQL authentication failed",
                    ),

                    // Access errors (42501)
                    SqlState::INSUFFICIENT_PRIVILEGE => (
                        ErrorKind::PermissionDenied,
                        "PostgreSQL permission denied",
                    ),

                    // Object collisions (42P07)
                    SqlState::DUPLICATE_TABLE => (
                        ErrorKind::DestinationTableAlreadyExists,
                        "PostgreSQL table already exists",
                    ),

                    // Schema/object not found errors (42xxx)
                    SqlState::UNDEFINED_TABLE
                    | SqlState::UNDEFINED_COLUMN
                    | SqlState::UNDEFINED_SCHEMA
                    | SqlState::INVALID_SCHEMA_NAME
                    | SqlState::UNDEFINED_OBJECT => (
                        ErrorKind::DestinationSchemaError,
                        "PostgreSQL schema object not found",
                    ),

                    // Syntax errors (42xxx)
                    SqlState::SYNTAX_ERROR
                    | SqlState::SYNTAX_ERROR_OR_ACCESS_RULE_VIOLATION
                    | SqlState::INVALID_NAME
                    | SqlState::DUPLICATE_COLUMN => (
                        ErrorKind::DestinationQueryFailed,
                        "PostgreSQL syntax error",
                    ),

                    // Data conversion errors (22xxx)
                    SqlState::DATA_EXCEPTION
                    | SqlState::INVALID_TEXT_REPRESENTATION
                    | SqlState::INVALID_DATETIME_FORMAT
                    | SqlState::NUMERIC_VALUE_OUT_OF_RANGE => (
                        ErrorKind::ConversionError,
                        "PostgreSQL data conversion failed",
                    ),

                    // Constraint violations (23xxx)
                    SqlState::INTEGRITY_CONSTRAINT_VIOLATION
                    | SqlState::NOT_NULL_VIOLATION
                    | SqlState::UNIQUE_VIOLATION
                    | SqlState::CHECK_VIOLATION => (
                        ErrorKind::ValidationError,
                        "PostgreSQL constraint violation",
                    ),

                    // Cancellation and timeouts (57xxx, 55P03)
                    SqlState::QUERY_CANCELED
                    | SqlState::OPERATOR_INTERVENTION
                    | SqlState::ADMIN_SHUTDOWN
                    | SqlState::CRASH_SHUTDOWN
                    | SqlState::LOCK_NOT_AVAILABLE => (
                        ErrorKind::DestinationOperationCanceled,
                        "PostgreSQL operation canceled",
                    ),

                    // Transaction errors (25xxx, 40xxx)
                    SqlState::TRANSACTION_ROLLBACK
                    | SqlState::T_R_SERIALIZATION_FAILURE
                    | SqlState::T_R_DEADLOCK_DETECTED
                    | SqlState::IN_FAILED_SQL_TRANSACTION
                    | SqlState::IDLE_IN_TRANSACTION_SESSION_TIMEOUT => {
                        (ErrorKind::InvalidState, "PostgreSQL transaction failed")
                    }

                    // Resource and system errors (53xxx, 58xxx)
                    SqlState::DISK_FULL | SqlState::IO_ERROR => {
                        (ErrorKind::DestinationIoError, "PostgreSQL I/O error")
                    }

                    _ => (ErrorKind::DestinationError, "PostgreSQL error"),
                }
            }
            // No SQL state means the connection itself failed.
            None => (
                ErrorKind::DestinationConnectionFailed,
                "PostgreSQL connection failed",
            ),
        };

        EtlError::wrap(kind, description, err)
    }
}
