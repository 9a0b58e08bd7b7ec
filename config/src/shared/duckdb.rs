use serde::{Deserialize, Serialize};

/// Location of the DuckDB database the pipeline runs in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DuckDbConfig {
    /// Path of the database file. An in-memory database is used when unset.
    #[serde(default)]
    pub path: Option<String>,
}
