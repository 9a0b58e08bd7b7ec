use config::shared::{ExportConfig, Materialization};
use pg_escape::quote_identifier;
use tracing::{info, warn};

use crate::destination::postgres::{
    CatalogConnector, PgCatalogConnector, ProvisionOutcome, TableProvisioner,
    render_attached_table_name,
};
use crate::error::{EtlError, EtlResult};
use crate::models::{Model, ModelContext};
use crate::session::{DatasetResolver, Session};
use crate::types::{Dataset, TableName};

pub const INSTALL_POSTGRES_SQL: &str = "INSTALL postgres;";
pub const LOAD_POSTGRES_SQL: &str = "LOAD postgres;";
pub const BEGIN_TRANSACTION_SQL: &str = "BEGIN TRANSACTION;";
pub const COMMIT_SQL: &str = "COMMIT;";
pub const ROLLBACK_SQL: &str = "ROLLBACK;";

/// Builds the statement attaching Postgres to the session under `alias`.
///
/// `IF NOT EXISTS` makes repeated exports in one session reuse the existing attachment.
pub fn attach_sql(conninfo: &str, alias: &str) -> String {
    format!(
        "ATTACH IF NOT EXISTS {} AS {} (TYPE postgres);",
        quote_string_literal(conninfo),
        quote_identifier(alias)
    )
}

pub fn truncate_sql(target: &str) -> String {
    format!("TRUNCATE {target};")
}

pub fn insert_select_sql(target: &str, source: &str) -> String {
    format!("INSERT INTO {target} SELECT * FROM {source};")
}

/// Quotes `value` as a SQL string literal, doubling embedded single quotes.
fn quote_string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Model copying its upstream dataset into a Postgres table through DuckDB's `postgres`
/// extension.
///
/// Every run provisions the table if needed, attaches Postgres, registers the dataset, empties
/// the table and inserts all rows (replace-all). The dataset is returned unchanged.
#[derive(Debug, Clone)]
pub struct ExportModel<C> {
    config: ExportConfig,
    provisioner: TableProvisioner<C>,
}

impl ExportModel<PgCatalogConnector> {
    /// Creates an export provisioning its table over a direct Postgres connection.
    pub fn postgres(config: ExportConfig) -> Self {
        let connector = PgCatalogConnector::new(config.destination.clone());
        Self::new(config, connector)
    }
}

impl<C> ExportModel<C>
where
    C: CatalogConnector + Sync,
{
    pub fn new(config: ExportConfig, connector: C) -> Self {
        let table_name = TableName::new(config.schema.clone(), config.table.clone());

        Self {
            provisioner: TableProvisioner::new(connector, table_name),
            config,
        }
    }

    /// Returns the destination table as seen through the attached database.
    pub fn target(&self) -> String {
        render_attached_table_name(&self.config.alias, self.provisioner.table_name())
    }

    async fn attach<S>(&self, session: &S) -> EtlResult<()>
    where
        S: Session + Sync,
    {
        let destination = &self.config.destination;

        session.execute(INSTALL_POSTGRES_SQL).await?;
        session.execute(LOAD_POSTGRES_SQL).await?;
        session
            .execute(&attach_sql(
                &destination.to_libpq_conninfo(),
                &self.config.alias,
            ))
            .await?;

        info!(
            alias = %self.config.alias,
            host = %destination.host,
            port = destination.port,
            database = %destination.name,
            "attached postgres database to duckdb session"
        );

        Ok(())
    }

    async fn replace_rows<S>(&self, session: &S, truncate: &str, insert: &str) -> EtlResult<()>
    where
        S: Session + Sync,
    {
        if !self.config.atomic_replace {
            session.execute(truncate).await?;
            return session.execute(insert).await;
        }

        session.execute(BEGIN_TRANSACTION_SQL).await?;

        let result = match session.execute(truncate).await {
            Ok(()) => session.execute(insert).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => session.execute(COMMIT_SQL).await,
            Err(err) => {
                warn!(table = %self.target(), "replacing rows failed, rolling back");

                match session.execute(ROLLBACK_SQL).await {
                    Ok(()) => Err(err),
                    Err(rollback_err) => Err(EtlError::from(vec![err, rollback_err])),
                }
            }
        }
    }
}

impl<C> Model for ExportModel<C>
where
    C: CatalogConnector + Sync,
{
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn run<S>(&self, ctx: &mut ModelContext<'_, S>, session: &S) -> EtlResult<Dataset>
    where
        S: Session + DatasetResolver + Sync,
    {
        ctx.config(Materialization::Table);

        let dataset = ctx.reference(&self.config.upstream).await?;

        let outcome = self.provisioner.ensure_table_exists(&dataset).await?;
        if outcome == ProvisionOutcome::AlreadyExists {
            info!(
                table = %self.provisioner.table_name(),
                "destination table already exists"
            );
        }

        self.attach(session).await?;
        session.register(&self.config.source_name, &dataset).await?;

        let target = self.target();
        let source = quote_identifier(&self.config.source_name).to_string();
        self.replace_rows(
            session,
            &truncate_sql(&target),
            &insert_select_sql(&target, &source),
        )
        .await?;

        info!(
            model = %self.config.name,
            table = %target,
            rows = dataset.num_rows(),
            atomic = self.config.atomic_replace,
            "exported dataset to postgres"
        );

        Ok(dataset)
    }
}
