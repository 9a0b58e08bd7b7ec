use std::future::Future;

use crate::error::EtlResult;
use crate::types::Dataset;

/// Capabilities a model needs from the analytical engine it runs in.
///
/// A session is owned by the caller and outlives a single model run, so anything a model sets
/// up through it (loaded extensions, attached databases, registered datasets) stays visible to
/// later models.
pub trait Session {
    /// Executes one or more SQL statements, discarding any result rows.
    fn execute(&self, sql: &str) -> impl Future<Output = EtlResult<()>> + Send;

    /// Makes `dataset` queryable under `name`, replacing any previous registration.
    fn register(&self, name: &str, dataset: &Dataset) -> impl Future<Output = EtlResult<()>> + Send;
}

/// Resolves named upstream relations into in-memory datasets.
pub trait DatasetResolver {
    /// Reads all rows of the relation called `name`.
    ///
    /// Fails with [`crate::error::ErrorKind::MissingDataset`] when no such relation exists.
    fn resolve(&self, name: &str) -> impl Future<Output = EtlResult<Dataset>> + Send;
}
