use std::future::Future;

use config::shared::{EXPORT_PROVISIONING_OPTIONS, PgConnectionConfig};
use postgres::catalog::table_exists;
use postgres::client::PgClient;
use tracing::debug;

use crate::error::EtlResult;
use crate::types::TableName;

/// Opens short-lived connections to the destination catalog.
pub trait CatalogConnector {
    type Client: CatalogClient + Send;

    /// Opens a new connection.
    fn connect(&self) -> impl Future<Output = EtlResult<Self::Client>> + Send;
}

/// Catalog operations needed to provision a destination table.
pub trait CatalogClient {
    /// Returns whether `table_name` exists.
    fn table_exists(
        &mut self,
        table_name: &TableName,
    ) -> impl Future<Output = EtlResult<bool>> + Send;

    /// Runs `ddl`, which creates `table_name`, in its own transaction and commits it.
    fn create_table(
        &mut self,
        table_name: &TableName,
        ddl: &str,
    ) -> impl Future<Output = EtlResult<()>> + Send;

    /// Closes the connection.
    fn close(self) -> impl Future<Output = ()> + Send;
}

/// [`CatalogConnector`] that connects directly to Postgres.
#[derive(Debug, Clone)]
pub struct PgCatalogConnector {
    config: PgConnectionConfig,
}

impl PgCatalogConnector {
    pub fn new(config: PgConnectionConfig) -> Self {
        Self { config }
    }
}

impl CatalogConnector for PgCatalogConnector {
    type Client = PgCatalogClient;

    async fn connect(&self) -> EtlResult<PgCatalogClient> {
        let client = PgClient::connect(&self.config, Some(&EXPORT_PROVISIONING_OPTIONS)).await?;

        Ok(PgCatalogClient { client })
    }
}

/// [`CatalogClient`] over a direct Postgres connection.
#[derive(Debug)]
pub struct PgCatalogClient {
    client: PgClient,
}

impl CatalogClient for PgCatalogClient {
    async fn table_exists(&mut self, table_name: &TableName) -> EtlResult<bool> {
        let exists = table_exists(self.client.client(), table_name).await?;

        debug!(table = %table_name, exists, "checked destination table existence");

        Ok(exists)
    }

    async fn create_table(&mut self, table_name: &TableName, ddl: &str) -> EtlResult<()> {
        let transaction = self.client.client_mut().transaction().await?;
        transaction.batch_execute(ddl).await?;
        transaction.commit().await?;

        debug!(table = %table_name, "committed destination table ddl");

        Ok(())
    }

    async fn close(self) {
        self.client.close().await;
    }
}
