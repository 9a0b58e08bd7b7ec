use serde::Deserialize;

use crate::shared::{PgConnectionConfig, ValidationError};

const fn default_atomic_replace() -> bool {
    false
}

fn default_schema() -> String {
    "public".to_owned()
}

fn default_alias() -> String {
    "mydb".to_owned()
}

fn default_source_name() -> String {
    "export_df".to_owned()
}

/// Configuration of the model copying an upstream dataset into a Postgres table.
///
/// This intentionally does not implement [`serde::Serialize`] since it embeds the destination
/// credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Name under which the model's (pass-through) output is materialized.
    pub name: String,
    /// Name of the upstream dataset to export.
    pub upstream: String,
    /// Connection to the destination Postgres database.
    pub destination: PgConnectionConfig,
    /// Schema of the destination table. Defaults to `public`.
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Name of the destination table.
    pub table: String,
    /// Session-local alias under which Postgres is attached to DuckDB. Defaults to `mydb`.
    #[serde(default = "default_alias")]
    pub alias: String,
    /// Name under which the dataset is registered in the DuckDB session. Defaults to
    /// `export_df`.
    #[serde(default = "default_source_name")]
    pub source_name: String,
    /// Wraps the truncate and the insert in one DuckDB transaction.
    ///
    /// Defaults to `false`, where a failure after the truncate leaves the table empty.
    #[serde(default = "default_atomic_replace")]
    pub atomic_replace: bool,
}

impl ExportConfig {
    /// Validates the export settings and the destination connection.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("export.name", &self.name),
            ("export.upstream", &self.upstream),
            ("export.schema", &self.schema),
            ("export.table", &self.table),
            ("export.alias", &self.alias),
            ("export.source_name", &self.source_name),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::EmptyField(field));
            }
        }

        if self.alias == self.source_name {
            return Err(ValidationError::AliasCollidesWithSource(self.alias.clone()));
        }

        self.destination.validate()
    }
}
