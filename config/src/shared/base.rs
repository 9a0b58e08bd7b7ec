use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// TLS is enabled but no trusted root certificates are provided.
    #[error("Invalid TLS config: `trusted_root_certs` must be set when `enabled` is true")]
    MissingTrustedRootCerts,
    /// A required string field is empty.
    #[error("`{0}` cannot be empty")]
    EmptyField(&'static str),
    /// The Postgres port is zero.
    #[error("`port` cannot be zero")]
    PortZero,
    /// The session-local alias of the attached database collides with the registered source.
    #[error("`alias` and `source_name` must differ, both are `{0}`")]
    AliasCollidesWithSource(String),
    /// Two models, seeds or exports share the same name.
    #[error("model name `{0}` is used more than once")]
    DuplicateModelName(String),
}
