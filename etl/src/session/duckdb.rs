use std::sync::{Arc, Mutex};

use ::duckdb::types::{TimeUnit, Value};
use ::duckdb::{Connection, params_from_iter};
use chrono::{DateTime, NaiveDate, TimeDelta};
use config::shared::DuckDbConfig;
use postgres::schema::quote_identifier_always;
use tracing::{debug, info};

use crate::error::{ErrorKind, EtlError, EtlResult};
use crate::session::{DatasetResolver, Session};
use crate::types::{Cell, ColumnSchema, DataType, Dataset, TableRow};
use crate::{bail, etl_error};

/// A [`Session`] backed by one embedded DuckDB connection.
///
/// All calls share the same connection, so temporary tables, loaded extensions and attached
/// databases persist across them. DuckDB's API is synchronous; every call runs on the blocking
/// thread pool while holding the connection lock.
#[derive(Clone)]
pub struct DuckDbSession {
    connection: Arc<Mutex<Connection>>,
}

impl DuckDbSession {
    /// Opens the database configured in `config`, in memory when no path is set.
    pub fn open(config: &DuckDbConfig) -> EtlResult<Self> {
        match &config.path {
            Some(path) => {
                let connection = Connection::open(path).map_err(|e| {
                    etl_error!(
                        ErrorKind::SessionConnectionFailed,
                        "Failed to open DuckDB database",
                        format!("path `{path}`"),
                        source: e
                    )
                })?;

                info!(%path, "opened duckdb database");

                Ok(Self::from_connection(connection))
            }
            None => Self::open_in_memory(),
        }
    }

    /// Opens a fresh in-memory database, dropped with the last clone of the session.
    pub fn open_in_memory() -> EtlResult<Self> {
        let connection = Connection::open_in_memory().map_err(|e| {
            etl_error!(
                ErrorKind::SessionConnectionFailed,
                "Failed to open in-memory DuckDB database",
                source: e
            )
        })?;

        info!("opened in-memory duckdb database");

        Ok(Self::from_connection(connection))
    }

    fn from_connection(connection: Connection) -> Self {
        Self {
            connection: Arc::new(Mutex::new(connection)),
        }
    }

    /// Runs `f` with exclusive access to the connection on the blocking thread pool.
    async fn with_connection<F, T>(&self, f: F) -> EtlResult<T>
    where
        F: FnOnce(&mut Connection) -> EtlResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let connection = self.connection.clone();

        tokio::task::spawn_blocking(move || -> EtlResult<T> {
            let mut connection = connection.lock().map_err(|_| {
                etl_error!(
                    ErrorKind::InvalidState,
                    "DuckDB connection lock is poisoned"
                )
            })?;

            f(&mut connection)
        })
        .await
        .map_err(|e| {
            etl_error!(
                ErrorKind::SessionTaskPanic,
                "DuckDB blocking task panicked",
                source: e
            )
        })?
    }
}

impl Session for DuckDbSession {
    async fn execute(&self, sql: &str) -> EtlResult<()> {
        let sql = sql.to_owned();

        self.with_connection(move |connection| {
            connection.execute_batch(&sql)?;
            Ok(())
        })
        .await
    }

    async fn register(&self, name: &str, dataset: &Dataset) -> EtlResult<()> {
        if dataset.columns().is_empty() {
            bail!(
                ErrorKind::InvalidData,
                "Cannot register a dataset without columns",
                format!("dataset `{name}`")
            );
        }

        let table = quote_identifier_always(name);
        let create_sql = build_temp_table_sql(&table, dataset.columns());
        let insert_sql = build_insert_sql(&table, dataset.columns().len());
        let dataset = dataset.clone();

        self.with_connection(move |connection| {
            let transaction = connection.transaction()?;
            transaction.execute_batch(&create_sql)?;

            {
                let mut statement = transaction.prepare(&insert_sql)?;
                for row in dataset.rows() {
                    let values: Vec<Value> =
                        row.values().iter().cloned().map(cell_to_value).collect();
                    statement.execute(params_from_iter(values))?;
                }
            }

            transaction.commit()?;

            debug!(
                table = %table,
                rows = dataset.num_rows(),
                "registered dataset in duckdb"
            );

            Ok(())
        })
        .await
    }
}

impl DatasetResolver for DuckDbSession {
    async fn resolve(&self, name: &str) -> EtlResult<Dataset> {
        let name = name.to_owned();

        self.with_connection(move |connection| {
            let exists: i64 = connection.query_row(
                "select count(*) from information_schema.tables \
                 where table_catalog in (current_database(), 'temp') and table_name = ?",
                [name.as_str()],
                |row| row.get(0),
            )?;

            if exists == 0 {
                bail!(
                    ErrorKind::MissingDataset,
                    "Upstream relation does not exist",
                    format!("relation `{name}`")
                );
            }

            let relation = quote_identifier_always(&name);

            let mut describe = connection.prepare(&format!("describe select * from {relation}"))?;
            let described = describe
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;

            let mut columns = Vec::with_capacity(described.len());
            let mut projections = Vec::with_capacity(described.len());
            for (column_name, duckdb_type) in described {
                let (data_type, needs_cast) = DataType::from_duckdb_type(&duckdb_type);
                let quoted = quote_identifier_always(&column_name);

                if needs_cast {
                    debug!(
                        column = %column_name,
                        from = %duckdb_type,
                        to = data_type.duckdb_type(),
                        "casting column while reading relation"
                    );
                    projections.push(format!(
                        "cast({quoted} as {}) as {quoted}",
                        data_type.duckdb_type()
                    ));
                } else {
                    projections.push(quoted);
                }

                columns.push(ColumnSchema::new(column_name, data_type));
            }

            let mut statement = connection.prepare(&format!(
                "select {} from {relation}",
                projections.join(", ")
            ))?;
            let mut result = statement.query([])?;

            let mut rows = Vec::new();
            while let Some(row) = result.next()? {
                let mut cells = Vec::with_capacity(columns.len());
                for (index, column) in columns.iter().enumerate() {
                    let value: Value = row.get(index)?;
                    cells.push(value_to_cell(value, column)?);
                }
                rows.push(TableRow::new(cells));
            }

            debug!(relation = %name, rows = rows.len(), "resolved relation from duckdb");

            Dataset::new(columns, rows)
        })
        .await
    }
}

/// Builds the `CREATE OR REPLACE TEMP TABLE` statement holding a registered dataset.
fn build_temp_table_sql(table: &str, columns: &[ColumnSchema]) -> String {
    let column_defs: Vec<String> = columns
        .iter()
        .map(|column| {
            format!(
                "{} {}",
                quote_identifier_always(&column.name),
                column.data_type.duckdb_type()
            )
        })
        .collect();

    format!(
        "create or replace temp table {table} ({})",
        column_defs.join(", ")
    )
}

fn build_insert_sql(table: &str, num_columns: usize) -> String {
    let placeholders = vec!["?"; num_columns].join(", ");
    format!("insert into {table} values ({placeholders})")
}

fn epoch_date() -> NaiveDate {
    NaiveDate::default()
}

fn cell_to_value(cell: Cell) -> Value {
    match cell {
        Cell::Null => Value::Null,
        Cell::Bool(b) => Value::Boolean(b),
        Cell::I16(i) => Value::SmallInt(i),
        Cell::I32(i) => Value::Int(i),
        Cell::I64(i) => Value::BigInt(i),
        Cell::F32(f) => Value::Float(f),
        Cell::F64(f) => Value::Double(f),
        Cell::String(s) => Value::Text(s),
        Cell::Date(d) => {
            let days = d.signed_duration_since(epoch_date()).num_days() as i32;
            Value::Date32(days)
        }
        Cell::Timestamp(dt) => {
            Value::Timestamp(TimeUnit::Microsecond, dt.and_utc().timestamp_micros())
        }
        Cell::TimestampTz(dt) => Value::Timestamp(TimeUnit::Microsecond, dt.timestamp_micros()),
        Cell::Bytes(b) => Value::Blob(b),
    }
}

fn timestamp_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

/// Converts a value read from DuckDB into the [`Cell`] variant of `column`'s type.
fn value_to_cell(value: Value, column: &ColumnSchema) -> EtlResult<Cell> {
    let cell = match (value, column.data_type) {
        (Value::Null, _) => Cell::Null,
        (Value::Boolean(b), DataType::Bool) => Cell::Bool(b),
        (Value::SmallInt(i), DataType::Int16) => Cell::I16(i),
        (Value::Int(i), DataType::Int32) => Cell::I32(i),
        (Value::BigInt(i), DataType::Int64) => Cell::I64(i),
        (Value::Float(f), DataType::Float32) => Cell::F32(f),
        (Value::Double(f), DataType::Float64) => Cell::F64(f),
        (Value::Text(s), DataType::String) => Cell::String(s),
        (Value::Blob(b), DataType::Bytes) => Cell::Bytes(b),
        (Value::Date32(days), DataType::Date) => {
            let date = epoch_date()
                .checked_add_signed(TimeDelta::days(days.into()))
                .ok_or_else(|| out_of_range(column, days))?;
            Cell::Date(date)
        }
        (Value::Timestamp(unit, value), DataType::Timestamp) => {
            let timestamp = DateTime::from_timestamp_micros(timestamp_micros(unit, value))
                .ok_or_else(|| out_of_range(column, value))?;
            Cell::Timestamp(timestamp.naive_utc())
        }
        (Value::Timestamp(unit, value), DataType::TimestampTz) => {
            let timestamp = DateTime::from_timestamp_micros(timestamp_micros(unit, value))
                .ok_or_else(|| out_of_range(column, value))?;
            Cell::TimestampTz(timestamp)
        }
        (value, data_type) => bail!(
            ErrorKind::ConversionError,
            "Unexpected DuckDB value for column type",
            format!("column `{}` ({data_type}): {value:?}", column.name)
        ),
    };

    Ok(cell)
}

fn out_of_range(column: &ColumnSchema, value: impl std::fmt::Display) -> EtlError {
    etl_error!(
        ErrorKind::ConversionError,
        "Temporal value is out of range",
        format!("column `{}`: {value}", column.name)
    )
}
