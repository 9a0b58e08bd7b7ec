use serde::Deserialize;
use std::collections::HashSet;

use crate::Config;
use crate::shared::{
    DuckDbConfig, ExportConfig, SeedConfig, SqlModelConfig, TransformConfig, ValidationError,
};

/// Top-level configuration of the `runner` binary.
///
/// Seeds are loaded first, then the transform model, the SQL models in order, and finally the
/// export model runs.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    #[serde(default)]
    pub duckdb: DuckDbConfig,
    #[serde(default)]
    pub seeds: Vec<SeedConfig>,
    pub transform: TransformConfig,
    #[serde(default)]
    pub sql_models: Vec<SqlModelConfig>,
    pub export: ExportConfig,
}

impl RunnerConfig {
    /// Validates every section and checks that relation names are unique.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for seed in &self.seeds {
            seed.validate()?;
        }
        self.transform.validate()?;
        for model in &self.sql_models {
            model.validate()?;
        }
        self.export.validate()?;

        let mut names = HashSet::new();
        let all_names = self
            .seeds
            .iter()
            .map(|seed| &seed.name)
            .chain(std::iter::once(&self.transform.name))
            .chain(self.sql_models.iter().map(|model| &model.name))
            .chain(std::iter::once(&self.export.name));

        for name in all_names {
            if !names.insert(name.as_str()) {
                return Err(ValidationError::DuplicateModelName(name.clone()));
            }
        }

        Ok(())
    }
}

impl Config for RunnerConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        RunnerConfig::validate(self)
    }
}
