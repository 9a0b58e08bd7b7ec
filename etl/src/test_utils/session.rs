use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::bail;
use crate::error::{ErrorKind, EtlResult};
use crate::session::{DatasetResolver, Session};
use crate::types::Dataset;

/// A call made against a [`MemorySession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOperation {
    Execute(String),
    Register { name: String, rows: usize },
}

#[derive(Debug, Default)]
struct SessionState {
    operations: Vec<SessionOperation>,
    relations: HashMap<String, Dataset>,
    fail_on: Option<String>,
}

/// In-memory [`Session`] that records calls and simulates a handful of statements.
///
/// Understood statements, matched case-insensitively:
/// - `TRUNCATE <t>` empties relation `<t>` if it exists.
/// - `INSERT INTO <t> SELECT * FROM <s>` appends the rows of `<s>` to `<t>`, creating `<t>`.
/// - `CREATE OR REPLACE TABLE|VIEW <t> AS SELECT * FROM <s>` copies `<s>` into `<t>` when `<s>`
///   is a known relation.
///
/// Everything else is only recorded.
#[derive(Debug, Clone, Default)]
pub struct MemorySession {
    state: Arc<Mutex<SessionState>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `dataset` as relation `name`, without recording an operation.
    pub fn insert_relation(&self, name: &str, dataset: Dataset) {
        self.lock().relations.insert(normalize_name(name), dataset);
    }

    /// Returns the current contents of relation `name`.
    pub fn relation(&self, name: &str) -> Option<Dataset> {
        self.lock().relations.get(&normalize_name(name)).cloned()
    }

    /// Makes every statement containing `needle` (case-insensitive) fail.
    pub fn fail_on(&self, needle: &str) {
        self.lock().fail_on = Some(needle.to_lowercase());
    }

    pub fn operations(&self) -> Vec<SessionOperation> {
        self.lock().operations.clone()
    }

    /// Returns the executed SQL, in order.
    pub fn statements(&self) -> Vec<String> {
        self.lock()
            .operations
            .iter()
            .filter_map(|operation| match operation {
                SessionOperation::Execute(sql) => Some(sql.clone()),
                SessionOperation::Register { .. } => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().expect("session state lock poisoned")
    }
}

impl Session for MemorySession {
    async fn execute(&self, sql: &str) -> EtlResult<()> {
        let mut state = self.lock();
        state.operations.push(SessionOperation::Execute(sql.to_owned()));

        let normalized = sql
            .trim()
            .trim_end_matches(';')
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        let injected_failure = state
            .fail_on
            .as_deref()
            .is_some_and(|needle| normalized.contains(needle));
        if injected_failure {
            bail!(
                ErrorKind::SessionQueryFailed,
                "DuckDB statement failed",
                format!("injected failure for `{sql}`")
            );
        }

        let tokens: Vec<&str> = normalized.split(' ').collect();
        match tokens.as_slice() {
            ["truncate", target] => {
                if let Some(relation) = state.relations.get_mut(&normalize_name(target)) {
                    *relation = Dataset::empty(relation.columns().to_vec());
                }
            }
            ["insert", "into", target, "select", "*", "from", source] => {
                let source = lookup(&state.relations, source)?;
                let target = normalize_name(target);

                let (columns, mut rows) = match state.relations.remove(&target) {
                    Some(existing) => existing.into_parts(),
                    None => (source.columns().to_vec(), Vec::new()),
                };
                rows.extend(source.into_parts().1);
                state.relations.insert(target, Dataset::new(columns, rows)?);
            }
            ["create", "or", "replace", "table" | "view", target, "as", "select", "*", "from", source] =>
            {
                if let Some(source) = state.relations.get(&normalize_name(source)).cloned() {
                    state.relations.insert(normalize_name(target), source);
                }
            }
            _ => {}
        }

        Ok(())
    }

    async fn register(&self, name: &str, dataset: &Dataset) -> EtlResult<()> {
        let mut state = self.lock();
        state.operations.push(SessionOperation::Register {
            name: name.to_owned(),
            rows: dataset.num_rows(),
        });
        state
            .relations
            .insert(normalize_name(name), dataset.clone());

        Ok(())
    }
}

impl DatasetResolver for MemorySession {
    async fn resolve(&self, name: &str) -> EtlResult<Dataset> {
        lookup(&self.lock().relations, name)
    }
}

fn normalize_name(name: &str) -> String {
    name.replace('"', "").to_lowercase()
}

fn lookup(relations: &HashMap<String, Dataset>, name: &str) -> EtlResult<Dataset> {
    match relations.get(&normalize_name(name)) {
        Some(dataset) => Ok(dataset.clone()),
        None => bail!(
            ErrorKind::MissingDataset,
            "Upstream relation does not exist",
            format!("relation `{name}`")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::dataset::scores_dataset_with_rows;

    #[tokio::test]
    async fn test_simulates_truncate_and_insert() {
        let session = MemorySession::new();
        session
            .register("export_df", &scores_dataset_with_rows(2))
            .await
            .unwrap();

        session
            .execute("INSERT INTO mydb.final_output SELECT * FROM export_df;")
            .await
            .unwrap();
        session
            .execute("INSERT INTO mydb.final_output SELECT * FROM export_df;")
            .await
            .unwrap();
        assert_eq!(session.relation("mydb.final_output").unwrap().num_rows(), 4);

        session.execute("TRUNCATE mydb.final_output;").await.unwrap();
        assert_eq!(session.relation("mydb.final_output").unwrap().num_rows(), 0);
    }

    #[tokio::test]
    async fn test_injected_failure_is_recorded() {
        let session = MemorySession::new();
        session.fail_on("truncate");

        let err = session.execute("TRUNCATE t;").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SessionQueryFailed);
        assert_eq!(session.statements(), vec!["TRUNCATE t;".to_string()]);
    }

    #[tokio::test]
    async fn test_resolve_missing_relation() {
        let err = MemorySession::new().resolve("nope").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MissingDataset);
    }
}
