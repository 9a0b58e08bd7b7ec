use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::destination::postgres::{CatalogClient, CatalogConnector};
use crate::error::{ErrorKind, EtlResult};
use crate::etl_error;
use crate::types::TableName;

#[derive(Debug, Default)]
struct CatalogState {
    tables: HashSet<TableName>,
    ddl_statements: Vec<String>,
    existence_checks: usize,
    connections_opened: usize,
    connections_closed: usize,
    fail_next_create: bool,
}

/// In-memory destination catalog that records every operation.
///
/// Clones share state, so a test can keep one handle and pass another to the code under test.
#[derive(Debug, Clone, Default)]
pub struct RecordingCatalog {
    state: Arc<Mutex<CatalogState>>,
}

impl RecordingCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog in which `tables` already exist.
    pub fn with_tables(tables: impl IntoIterator<Item = TableName>) -> Self {
        let catalog = Self::new();
        catalog.lock().tables.extend(tables);
        catalog
    }

    /// Makes the next `create_table` fail as if the user lacked privileges.
    pub fn fail_next_create(&self) {
        self.lock().fail_next_create = true;
    }

    pub fn contains_table(&self, table_name: &TableName) -> bool {
        self.lock().tables.contains(table_name)
    }

    pub fn ddl_statements(&self) -> Vec<String> {
        self.lock().ddl_statements.clone()
    }

    pub fn existence_checks(&self) -> usize {
        self.lock().existence_checks
    }

    pub fn connections_opened(&self) -> usize {
        self.lock().connections_opened
    }

    pub fn connections_closed(&self) -> usize {
        self.lock().connections_closed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CatalogState> {
        self.state.lock().expect("catalog state lock poisoned")
    }
}

impl CatalogConnector for RecordingCatalog {
    type Client = RecordingCatalogClient;

    async fn connect(&self) -> EtlResult<RecordingCatalogClient> {
        self.lock().connections_opened += 1;

        Ok(RecordingCatalogClient {
            catalog: self.clone(),
        })
    }
}

/// Connection handed out by [`RecordingCatalog`].
#[derive(Debug)]
pub struct RecordingCatalogClient {
    catalog: RecordingCatalog,
}

impl CatalogClient for RecordingCatalogClient {
    async fn table_exists(&mut self, table_name: &TableName) -> EtlResult<bool> {
        let mut state = self.catalog.lock();
        state.existence_checks += 1;

        Ok(state.tables.contains(table_name))
    }

    async fn create_table(&mut self, table_name: &TableName, ddl: &str) -> EtlResult<()> {
        let mut state = self.catalog.lock();

        if std::mem::take(&mut state.fail_next_create) {
            return Err(etl_error!(
                ErrorKind::PermissionDenied,
                "PostgreSQL permission denied",
                format!("permission denied for schema {}", table_name.schema)
            ));
        }

        if !state.tables.insert(table_name.clone()) {
            return Err(etl_error!(
                ErrorKind::DestinationTableAlreadyExists,
                "PostgreSQL table already exists",
                format!("relation \"{}\" already exists", table_name.name)
            ));
        }

        state.ddl_statements.push(ddl.to_owned());

        Ok(())
    }

    async fn close(self) {
        self.catalog.lock().connections_closed += 1;
    }
}
