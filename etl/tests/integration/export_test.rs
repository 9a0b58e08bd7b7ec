use config::shared::ExportConfig;
use etl::destination::postgres::PgCatalogConnector;
use etl::models::export::ExportModel;
use etl::models::{Model, ModelContext};
use etl::session::Session;
use etl::session::duckdb::DuckDbSession;
use etl::types::{Dataset, TableName};
use postgres::test_utils::PgDatabase;
use telemetry::init_test_tracing;

use crate::database::{TEST_DATABASE_SCHEMA, public_table_name, spawn_database, test_table_name};

fn export_config(database: &PgDatabase, schema: &str, atomic_replace: bool) -> ExportConfig {
    ExportConfig {
        name: "export_to_postgres".to_string(),
        upstream: "my_sql_model".to_string(),
        destination: database.config.clone(),
        schema: schema.to_string(),
        table: "final_output".to_string(),
        alias: "mydb".to_string(),
        source_name: "export_df".to_string(),
        atomic_replace,
    }
}

async fn create_upstream(session: &DuckDbSession, num_rows: i64) {
    session
        .execute(&format!(
            "CREATE OR REPLACE TABLE my_sql_model AS \
             SELECT i::BIGINT AS id, 'name_' || i::VARCHAR AS full_name, i % 2 = 0 AS active, \
             DATE '2025-04-17' + i::INTEGER AS loaded_on \
             FROM range(1, {}) t(i);",
            num_rows + 1
        ))
        .await
        .unwrap();
}

async fn run_export(model: &ExportModel<PgCatalogConnector>, session: &DuckDbSession) -> Dataset {
    let mut ctx = ModelContext::new(session);
    model.run(&mut ctx, session).await.unwrap()
}

async fn read_ids(database: &PgDatabase, table_name: &TableName) -> Vec<i64> {
    database
        .client()
        .query(
            &format!("select id from {} order by id", table_name.as_quoted_identifier()),
            &[],
        )
        .await
        .unwrap()
        .iter()
        .map(|row| row.get(0))
        .collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn export_provisions_table_and_copies_rows_test() {
    init_test_tracing();
    let database = spawn_database().await;
    let session = DuckDbSession::open_in_memory().unwrap();
    create_upstream(&session, 3).await;

    let model = ExportModel::postgres(export_config(&database, "public", false));
    let dataset = run_export(&model, &session).await;

    let table_name = public_table_name("final_output");
    assert_eq!(dataset.num_rows(), 3);
    assert_eq!(read_ids(&database, &table_name).await, vec![1, 2, 3]);
    assert_eq!(
        database.column_types(&table_name).await.unwrap(),
        vec![
            ("id".to_string(), "bigint".to_string()),
            ("full_name".to_string(), "text".to_string()),
            ("active".to_string(), "boolean".to_string()),
            (
                "loaded_on".to_string(),
                "timestamp without time zone".to_string()
            ),
        ]
    );

    let loaded_on: chrono::NaiveDateTime = database
        .client()
        .query_one("select loaded_on from final_output where id = 1", &[])
        .await
        .unwrap()
        .get(0);
    assert_eq!(loaded_on.to_string(), "2025-04-18 00:00:00");
}

#[tokio::test(flavor = "multi_thread")]
async fn repeated_export_replaces_rows_test() {
    init_test_tracing();
    let database = spawn_database().await;
    let session = DuckDbSession::open_in_memory().unwrap();
    let model = ExportModel::postgres(export_config(&database, "public", false));
    let table_name = public_table_name("final_output");

    create_upstream(&session, 5).await;
    run_export(&model, &session).await;
    assert_eq!(database.count_rows(&table_name).await.unwrap(), 5);

    create_upstream(&session, 2).await;
    run_export(&model, &session).await;
    assert_eq!(read_ids(&database, &table_name).await, vec![1, 2]);
}

#[tokio::test(flavor = "multi_thread")]
async fn atomic_export_into_custom_schema_test() {
    init_test_tracing();
    let database = spawn_database().await;
    let session = DuckDbSession::open_in_memory().unwrap();
    create_upstream(&session, 4).await;

    let model = ExportModel::postgres(export_config(&database, TEST_DATABASE_SCHEMA, true));
    run_export(&model, &session).await;
    run_export(&model, &session).await;

    let table_name = test_table_name("final_output");
    assert_eq!(read_ids(&database, &table_name).await, vec![1, 2, 3, 4]);
    assert_eq!(
        database
            .count_rows(&public_table_name("final_output"))
            .await
            .unwrap_err()
            .code()
            .map(|code| code.code().to_string()),
        Some("42P01".to_string())
    );
}
