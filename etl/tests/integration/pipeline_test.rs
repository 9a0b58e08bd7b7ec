use config::shared::{
    DuckDbConfig, ExportConfig, Materialization, SeedConfig, SqlModelConfig, TransformConfig,
};
use etl::models::export::ExportModel;
use etl::models::transform::TransformModel;
use etl::pipeline::Pipeline;
use etl::session::duckdb::DuckDbSession;
use telemetry::init_test_tracing;

use crate::database::{public_table_name, spawn_database};

#[tokio::test(flavor = "multi_thread")]
async fn seed_to_postgres_pipeline_test() {
    init_test_tracing();
    let database = spawn_database().await;

    let dir = tempfile::tempdir().unwrap();
    let seed_path = dir.path().join("my_seed_data.csv");
    std::fs::write(
        &seed_path,
        "id,first_name,last_name\n1,Ada,Lovelace\n2,Grace,Hopper\n3,Alan,Turing\n",
    )
    .unwrap();
    let duckdb_path = dir.path().join("pipeline.duckdb");

    let session = DuckDbSession::open(&DuckDbConfig {
        path: Some(duckdb_path.display().to_string()),
    })
    .unwrap();
    let pipeline = Pipeline::new(session);

    pipeline
        .load_seed(&SeedConfig {
            name: "my_seed_data".to_string(),
            path: seed_path.display().to_string(),
        })
        .await
        .unwrap();
    pipeline
        .run_model(&TransformModel::new(TransformConfig {
            name: "my_python_model".to_string(),
            upstream: "my_seed_data".to_string(),
        }))
        .await
        .unwrap();
    pipeline
        .run_sql_model(&SqlModelConfig {
            name: "my_sql_model".to_string(),
            sql: "select * from my_python_model order by id".to_string(),
            materialized: Materialization::View,
        })
        .await
        .unwrap();
    let exported = pipeline
        .run_model(&ExportModel::postgres(ExportConfig {
            name: "export_to_postgres".to_string(),
            upstream: "my_sql_model".to_string(),
            destination: database.config.clone(),
            schema: "public".to_string(),
            table: "final_output".to_string(),
            alias: "mydb".to_string(),
            source_name: "export_df".to_string(),
            atomic_replace: false,
        }))
        .await
        .unwrap();

    assert_eq!(exported.num_rows(), 3);

    let table_name = public_table_name("final_output");
    let rows = database
        .client()
        .query(
            "select full_name, name_length from final_output order by id",
            &[],
        )
        .await
        .unwrap();
    let rows: Vec<(String, i64)> = rows.iter().map(|row| (row.get(0), row.get(1))).collect();
    assert_eq!(
        rows,
        vec![
            ("Ada Lovelace".to_string(), 12),
            ("Grace Hopper".to_string(), 12),
            ("Alan Turing".to_string(), 11),
        ]
    );
    assert_eq!(
        database.column_types(&table_name).await.unwrap()[0],
        ("id".to_string(), "bigint".to_string())
    );
}
