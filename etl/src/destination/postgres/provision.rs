use tracing::info;

use crate::destination::postgres::{CatalogClient, CatalogConnector, build_create_table_sql};
use crate::error::EtlResult;
use crate::types::{Dataset, TableName};

/// Result of [`TableProvisioner::ensure_table_exists`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// The table was absent and has been created.
    Created,
    /// The table already existed and was left untouched.
    AlreadyExists,
}

/// Creates the destination table on first export.
///
/// The column list is inferred from the dataset passed to each call only. An existing table is
/// never altered, so later datasets are expected to keep the original columns.
#[derive(Debug, Clone)]
pub struct TableProvisioner<C> {
    connector: C,
    table_name: TableName,
}

impl<C> TableProvisioner<C>
where
    C: CatalogConnector + Sync,
{
    pub fn new(connector: C, table_name: TableName) -> Self {
        Self {
            connector,
            table_name,
        }
    }

    pub fn table_name(&self) -> &TableName {
        &self.table_name
    }

    /// Creates the destination table shaped like `dataset` unless it already exists.
    ///
    /// A new connection is opened for every call and closed on every path, including failures.
    pub async fn ensure_table_exists(&self, dataset: &Dataset) -> EtlResult<ProvisionOutcome> {
        let mut client = self.connector.connect().await?;
        let result = self.provision(&mut client, dataset).await;
        client.close().await;

        result
    }

    async fn provision(
        &self,
        client: &mut C::Client,
        dataset: &Dataset,
    ) -> EtlResult<ProvisionOutcome> {
        if client.table_exists(&self.table_name).await? {
            return Ok(ProvisionOutcome::AlreadyExists);
        }

        let ddl = build_create_table_sql(&self.table_name, dataset.columns());
        client.create_table(&self.table_name, &ddl).await?;

        info!(
            table = %self.table_name,
            columns = dataset.columns().len(),
            "created destination table in postgres"
        );

        Ok(ProvisionOutcome::Created)
    }
}
