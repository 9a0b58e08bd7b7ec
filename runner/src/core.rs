use config::shared::RunnerConfig;
use etl::destination::postgres::CatalogConnector;
use etl::error::EtlResult;
use etl::models::export::ExportModel;
use etl::models::transform::TransformModel;
use etl::pipeline::Pipeline;
use etl::session::duckdb::DuckDbSession;
use etl::session::{DatasetResolver, Session};
use tracing::{debug, info};

/// Opens the configured DuckDB database and runs every step of the pipeline.
pub async fn run_pipeline(config: RunnerConfig) -> EtlResult<()> {
    info!("starting pipeline run");

    log_config(&config);

    let session = DuckDbSession::open(&config.duckdb)?;
    let export = ExportModel::postgres(config.export.clone());

    run_steps(&Pipeline::new(session), &config, &export).await
}

/// Loads the seeds, then runs the transform model, the SQL models and the export model.
async fn run_steps<S, C>(
    pipeline: &Pipeline<S>,
    config: &RunnerConfig,
    export: &ExportModel<C>,
) -> EtlResult<()>
where
    S: Session + DatasetResolver + Sync,
    C: CatalogConnector + Sync,
{
    for seed in &config.seeds {
        pipeline.load_seed(seed).await?;
    }

    pipeline
        .run_model(&TransformModel::new(config.transform.clone()))
        .await?;

    for model in &config.sql_models {
        pipeline.run_sql_model(model).await?;
    }

    let exported = pipeline.run_model(export).await?;

    info!(
        rows = exported.num_rows(),
        table = %export.target(),
        "pipeline exported rows"
    );

    Ok(())
}

fn log_config(config: &RunnerConfig) {
    match &config.duckdb.path {
        Some(path) => debug!(%path, "using file-backed duckdb database"),
        None => debug!("using in-memory duckdb database"),
    }

    for seed in &config.seeds {
        debug!(seed = %seed.name, path = %seed.path, "using seed");
    }

    let export = &config.export;
    debug!(
        host = %export.destination.host,
        port = export.destination.port,
        database = %export.destination.name,
        username = %export.destination.username,
        tls_enabled = export.destination.tls.enabled,
        schema = %export.schema,
        table = %export.table,
        atomic_replace = export.atomic_replace,
        "using postgres export config"
    );
}
