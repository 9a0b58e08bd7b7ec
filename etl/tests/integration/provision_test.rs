use etl::destination::postgres::{PgCatalogConnector, ProvisionOutcome, TableProvisioner};
use etl::error::ErrorKind;
use etl::test_utils::dataset::{people_dataset, scores_dataset};
use etl::types::{Cell, ColumnSchema, DataType, Dataset, TableRow};
use telemetry::init_test_tracing;

use crate::database::{public_table_name, spawn_database, test_table_name};

#[tokio::test(flavor = "multi_thread")]
async fn missing_table_is_created_with_mapped_types_test() {
    init_test_tracing();
    let database = spawn_database().await;

    let table_name = public_table_name("final_output");
    let provisioner = TableProvisioner::new(
        PgCatalogConnector::new(database.config.clone()),
        table_name.clone(),
    );

    let dataset = Dataset::new(
        vec![
            ColumnSchema::new("id", DataType::Int32),
            ColumnSchema::new("score", DataType::Float64),
            ColumnSchema::new("active", DataType::Bool),
            ColumnSchema::new("loaded_at", DataType::Timestamp),
            ColumnSchema::new("full_name", DataType::String),
            ColumnSchema::new("born_on", DataType::Date),
        ],
        vec![TableRow::new(vec![
            Cell::I32(1),
            Cell::F64(0.5),
            Cell::Bool(true),
            Cell::Null,
            Cell::from("Ada Lovelace"),
            Cell::Null,
        ])],
    )
    .unwrap();

    let outcome = provisioner.ensure_table_exists(&dataset).await.unwrap();

    assert_eq!(outcome, ProvisionOutcome::Created);
    assert_eq!(
        database.column_types(&table_name).await.unwrap(),
        vec![
            ("id".to_string(), "bigint".to_string()),
            ("score".to_string(), "double precision".to_string()),
            ("active".to_string(), "boolean".to_string()),
            (
                "loaded_at".to_string(),
                "timestamp without time zone".to_string()
            ),
            ("full_name".to_string(), "text".to_string()),
            (
                "born_on".to_string(),
                "timestamp without time zone".to_string()
            ),
        ]
    );
    assert_eq!(database.count_rows(&table_name).await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn existing_table_is_left_untouched_test() {
    init_test_tracing();
    let database = spawn_database().await;

    let table_name = test_table_name("final_output");
    database
        .create_table(&table_name, &[("legacy", "integer")])
        .await
        .unwrap();
    let provisioner = TableProvisioner::new(
        PgCatalogConnector::new(database.config.clone()),
        table_name.clone(),
    );

    let outcome = provisioner
        .ensure_table_exists(&scores_dataset())
        .await
        .unwrap();

    assert_eq!(outcome, ProvisionOutcome::AlreadyExists);
    assert_eq!(
        database.column_types(&table_name).await.unwrap(),
        vec![("legacy".to_string(), "integer".to_string())]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn provisioning_twice_creates_once_test() {
    init_test_tracing();
    let database = spawn_database().await;

    let provisioner = TableProvisioner::new(
        PgCatalogConnector::new(database.config.clone()),
        public_table_name("people"),
    );
    let dataset = people_dataset(&[(Some("Ada"), Some("Lovelace"))]);

    let first = provisioner.ensure_table_exists(&dataset).await.unwrap();
    let second = provisioner.ensure_table_exists(&dataset).await.unwrap();

    assert_eq!(first, ProvisionOutcome::Created);
    assert_eq!(second, ProvisionOutcome::AlreadyExists);
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_database_fails_to_connect_test() {
    init_test_tracing();
    let database = spawn_database().await;

    let mut config = database.config.clone();
    config.name = format!("{}_missing", config.name);
    let provisioner =
        TableProvisioner::new(PgCatalogConnector::new(config), public_table_name("t"));

    let err = provisioner
        .ensure_table_exists(&scores_dataset())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DestinationConnectionFailed);
}
