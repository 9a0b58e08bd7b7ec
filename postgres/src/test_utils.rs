use config::shared::{IntoConnectOptions, PgConnectionConfig};
use tokio::runtime::Handle;
use tokio_postgres::{Client, NoTls};

use crate::client::PgClient;
use crate::schema::TableName;

/// Postgres database created for a single test and dropped with it.
///
/// Dropping requires a multi-threaded Tokio runtime.
pub struct PgDatabase {
    pub config: PgConnectionConfig,
    pub client: Option<PgClient>,
    destroy_on_drop: bool,
}

impl PgDatabase {
    /// Creates the database named in `config` and connects to it.
    pub async fn new(config: PgConnectionConfig) -> Self {
        let client = create_pg_database(&config).await;

        Self {
            config,
            client: Some(client),
            destroy_on_drop: true,
        }
    }

    /// Returns the client connected to the test database.
    pub fn client(&self) -> &Client {
        self.client
            .as_ref()
            .expect("test database client already released")
            .client()
    }

    /// Creates a table with the given column definitions.
    pub async fn create_table(
        &self,
        table_name: &TableName,
        columns: &[(&str, &str)],
    ) -> Result<(), tokio_postgres::Error> {
        let columns = columns
            .iter()
            .map(|(name, typ)| format!("{name} {typ}"))
            .collect::<Vec<_>>()
            .join(", ");

        self.client()
            .batch_execute(&format!(
                "create table {} ({columns})",
                table_name.as_quoted_identifier()
            ))
            .await
    }

    /// Returns `(column_name, data_type)` pairs for `table_name` in ordinal order.
    pub async fn column_types(
        &self,
        table_name: &TableName,
    ) -> Result<Vec<(String, String)>, tokio_postgres::Error> {
        let rows = self
            .client()
            .query(
                "select column_name, data_type from information_schema.columns \
                 where table_schema = $1 and table_name = $2 order by ordinal_position",
                &[&table_name.schema, &table_name.name],
            )
            .await?;

        Ok(rows
            .iter()
            .map(|row| (row.get::<_, String>(0), row.get::<_, String>(1)))
            .collect())
    }

    /// Returns the number of rows in `table_name`.
    pub async fn count_rows(&self, table_name: &TableName) -> Result<i64, tokio_postgres::Error> {
        let row = self
            .client()
            .query_one(
                &format!("select count(*) from {}", table_name.as_quoted_identifier()),
                &[],
            )
            .await?;

        Ok(row.get(0))
    }
}

impl Drop for PgDatabase {
    fn drop(&mut self) {
        if !self.destroy_on_drop {
            return;
        }

        let client = self.client.take();
        let config = self.config.clone();
        tokio::task::block_in_place(move || {
            Handle::current().block_on(async move {
                if let Some(client) = client {
                    client.close().await;
                }
                drop_pg_database(&config).await;
            });
        });
    }
}

/// Creates the database named in `config` and returns a client connected to it.
///
/// # Panics
/// Panics if connection or database creation fails.
pub async fn create_pg_database(config: &PgConnectionConfig) -> PgClient {
    let server_config: tokio_postgres::Config = config.without_db(None);
    let (client, connection) = server_config
        .connect(NoTls)
        .await
        .expect("Failed to connect to Postgres");
    let connection = tokio::spawn(connection);

    client
        .batch_execute(&format!(r#"create database "{}";"#, config.name))
        .await
        .expect("Failed to create database");

    drop(client);
    let _ = connection.await;

    PgClient::connect(config, None)
        .await
        .expect("Failed to connect to the test database")
}

/// Terminates open connections to the database named in `config` and drops it.
///
/// Never panics: failures are printed and ignored, since the database may already be gone.
pub async fn drop_pg_database(config: &PgConnectionConfig) {
    let server_config: tokio_postgres::Config = config.without_db(None);
    let (client, connection) = match server_config.connect(NoTls).await {
        Ok(connected) => connected,
        Err(e) => {
            eprintln!("warning: failed to connect to Postgres for cleanup: {e}");
            return;
        }
    };
    let connection = tokio::spawn(connection);

    if let Err(e) = client
        .execute(
            "select pg_terminate_backend(pid) from pg_stat_activity \
             where datname = $1 and pid <> pg_backend_pid()",
            &[&config.name],
        )
        .await
    {
        eprintln!(
            "warning: failed to terminate connections for database {}: {}",
            config.name, e
        );
    }

    if let Err(e) = client
        .batch_execute(&format!(r#"drop database if exists "{}";"#, config.name))
        .await
    {
        eprintln!("warning: failed to drop database {}: {}", config.name, e);
    }

    drop(client);
    let _ = connection.await;
}
