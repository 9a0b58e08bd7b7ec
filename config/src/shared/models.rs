use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// How the output of a model is persisted in the DuckDB session.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Materialization {
    /// Output is written to a table, replacing any previous contents.
    #[default]
    Table,
    /// Output is exposed as a view over its source.
    View,
}

/// A CSV file loaded into the session as a named table before any model runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Name of the table the seed is loaded into.
    pub name: String,
    /// Path of the CSV file, relative to the working directory.
    pub path: String,
}

impl SeedConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField("seeds.name"));
        }

        if self.path.trim().is_empty() {
            return Err(ValidationError::EmptyField("seeds.path"));
        }

        Ok(())
    }
}

/// A model defined by a single `SELECT` statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlModelConfig {
    /// Name of the relation the model materializes.
    pub name: String,
    /// The `SELECT` statement producing the model's rows.
    pub sql: String,
    #[serde(default)]
    pub materialized: Materialization,
}

impl SqlModelConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField("sql_models.name"));
        }

        if self.sql.trim().is_empty() {
            return Err(ValidationError::EmptyField("sql_models.sql"));
        }

        Ok(())
    }
}

/// Configuration of the model deriving `full_name` and `name_length`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Name under which the model's output is materialized.
    pub name: String,
    /// Name of the upstream dataset holding `first_name` and `last_name`.
    pub upstream: String,
}

impl TransformConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField("transform.name"));
        }

        if self.upstream.trim().is_empty() {
            return Err(ValidationError::EmptyField("transform.upstream"));
        }

        Ok(())
    }
}
