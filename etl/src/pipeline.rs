//! Sequential runner for seeds and models against one session.

use config::shared::{Materialization, SeedConfig, SqlModelConfig};
use postgres::schema::quote_identifier_always;
use tracing::{Instrument, info, info_span};

use crate::bail;
use crate::error::{ErrorKind, EtlResult};
use crate::models::{Model, ModelContext};
use crate::session::{DatasetResolver, Session};
use crate::types::Dataset;

/// Suffix of the relation a model's output is staged in before being materialized.
const STAGING_SUFFIX: &str = "__staging";

/// Runs seeds and models one after another on a shared session.
///
/// Each step materializes its output under its own name, so later steps can reference it.
#[derive(Debug)]
pub struct Pipeline<S> {
    session: S,
}

impl<S> Pipeline<S>
where
    S: Session + DatasetResolver + Sync,
{
    pub fn new(session: S) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Loads the CSV file of `seed` into a table named after the seed.
    pub async fn load_seed(&self, seed: &SeedConfig) -> EtlResult<()> {
        let sql = format!(
            "CREATE OR REPLACE TABLE {} AS SELECT * FROM read_csv_auto('{}');",
            quote_identifier_always(&seed.name),
            seed.path.replace('\'', "''")
        );

        self.session
            .execute(&sql)
            .instrument(info_span!("load_seed", seed = %seed.name))
            .await?;

        info!(seed = %seed.name, path = %seed.path, "loaded seed");

        Ok(())
    }

    /// Materializes the `SELECT` statement of `model` as a table or view named after it.
    pub async fn run_sql_model(&self, model: &SqlModelConfig) -> EtlResult<()> {
        let kind = match model.materialized {
            Materialization::Table => "TABLE",
            Materialization::View => "VIEW",
        };
        let sql = format!(
            "CREATE OR REPLACE {kind} {} AS {};",
            quote_identifier_always(&model.name),
            model.sql.trim().trim_end_matches(';')
        );

        self.session
            .execute(&sql)
            .instrument(info_span!("run_sql_model", model = %model.name))
            .await?;

        info!(model = %model.name, materialized = kind, "materialized sql model");

        Ok(())
    }

    /// Runs `model` and materializes the dataset it returns as a table named after it.
    ///
    /// Models returning datasets can only be materialized as tables.
    pub async fn run_model<M>(&self, model: &M) -> EtlResult<Dataset>
    where
        M: Model + Sync,
    {
        let span = info_span!("run_model", model = %model.name());

        self.run_model_in_span(model).instrument(span).await
    }

    async fn run_model_in_span<M>(&self, model: &M) -> EtlResult<Dataset>
    where
        M: Model + Sync,
    {
        let mut ctx = ModelContext::new(&self.session);
        let dataset = model.run(&mut ctx, &self.session).await?;

        if ctx.model_config().materialized != Materialization::Table {
            bail!(
                ErrorKind::ConfigError,
                "Models returning datasets must be materialized as tables",
                format!("model `{}`", model.name())
            );
        }

        self.materialize(model.name(), &dataset).await?;

        info!(
            references = ?ctx.references(),
            rows = dataset.num_rows(),
            "materialized model"
        );

        Ok(dataset)
    }

    async fn materialize(&self, name: &str, dataset: &Dataset) -> EtlResult<()> {
        let staging = format!("{name}{STAGING_SUFFIX}");
        self.session.register(&staging, dataset).await?;

        self.session
            .execute(&format!(
                "CREATE OR REPLACE TABLE {} AS SELECT * FROM {};",
                quote_identifier_always(name),
                quote_identifier_always(&staging)
            ))
            .await?;
        self.session
            .execute(&format!(
                "DROP TABLE IF EXISTS {};",
                quote_identifier_always(&staging)
            ))
            .await
    }
}
