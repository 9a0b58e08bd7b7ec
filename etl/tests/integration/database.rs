use config::shared::{PgConnectionConfig, TlsConfig};
use etl::types::TableName;
use postgres::test_utils::PgDatabase;
use uuid::Uuid;

/// Schema created in every test database for tables outside `public`.
pub const TEST_DATABASE_SCHEMA: &str = "test";

pub fn public_table_name(name: &str) -> TableName {
    TableName::new("public".to_owned(), name.to_owned())
}

pub fn test_table_name(name: &str) -> TableName {
    TableName::new(TEST_DATABASE_SCHEMA.to_owned(), name.to_owned())
}

/// Builds the connection config of a fresh, uniquely named database.
///
/// Reads `TESTS_DATABASE_HOST`, `TESTS_DATABASE_PORT`, `TESTS_DATABASE_USERNAME` and optionally
/// `TESTS_DATABASE_PASSWORD`.
fn local_pg_connection_config() -> PgConnectionConfig {
    PgConnectionConfig {
        host: std::env::var("TESTS_DATABASE_HOST").expect("TESTS_DATABASE_HOST must be set"),
        port: std::env::var("TESTS_DATABASE_PORT")
            .expect("TESTS_DATABASE_PORT must be set")
            .parse()
            .expect("TESTS_DATABASE_PORT must be a valid port number"),
        name: Uuid::new_v4().to_string(),
        username: std::env::var("TESTS_DATABASE_USERNAME")
            .expect("TESTS_DATABASE_USERNAME must be set"),
        password: std::env::var("TESTS_DATABASE_PASSWORD")
            .ok()
            .map(Into::into),
        tls: TlsConfig::disabled(),
    }
}

/// Creates a uniquely named database containing the [`TEST_DATABASE_SCHEMA`] schema.
pub async fn spawn_database() -> PgDatabase {
    let database = PgDatabase::new(local_pg_connection_config()).await;

    database
        .client()
        .batch_execute(&format!("create schema {TEST_DATABASE_SCHEMA}"))
        .await
        .expect("Failed to create test schema");

    database
}
