use std::future::Future;

use config::shared::Materialization;
use tracing::debug;

use crate::error::EtlResult;
use crate::session::{DatasetResolver, Session};
use crate::types::Dataset;

/// Per-model settings a model can adjust while it runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelConfig {
    pub materialized: Materialization,
}

/// Handle passed to a running model.
///
/// Resolves upstream references and collects the model's configuration. References are recorded
/// in call order so the caller can report the lineage of a run.
pub struct ModelContext<'a, R> {
    resolver: &'a R,
    config: ModelConfig,
    references: Vec<String>,
}

impl<'a, R> ModelContext<'a, R>
where
    R: DatasetResolver + Sync,
{
    pub fn new(resolver: &'a R) -> Self {
        Self {
            resolver,
            config: ModelConfig::default(),
            references: Vec::new(),
        }
    }

    /// Sets how the model's output is materialized.
    pub fn config(&mut self, materialized: Materialization) {
        self.config.materialized = materialized;
    }

    pub fn model_config(&self) -> ModelConfig {
        self.config
    }

    /// Reads the upstream relation called `name`.
    pub async fn reference(&mut self, name: &str) -> EtlResult<Dataset> {
        self.references.push(name.to_owned());

        let dataset = self.resolver.resolve(name).await?;

        debug!(reference = name, rows = dataset.num_rows(), "resolved model reference");

        Ok(dataset)
    }

    /// Returns the names referenced so far.
    pub fn references(&self) -> &[String] {
        &self.references
    }
}

/// A named pipeline step that produces one dataset.
pub trait Model {
    /// Returns the name the model's output is materialized under.
    fn name(&self) -> &str;

    /// Runs the model and returns its output.
    fn run<S>(
        &self,
        ctx: &mut ModelContext<'_, S>,
        session: &S,
    ) -> impl Future<Output = EtlResult<Dataset>> + Send
    where
        S: Session + DatasetResolver + Sync;
}
