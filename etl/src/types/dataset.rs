use crate::bail;
use crate::error::{ErrorKind, EtlResult};
use crate::types::{Cell, DataType};

/// Name and type of a dataset column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: DataType,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A complete row of a [`Dataset`], with values in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    values: Vec<Cell>,
}

impl TableRow {
    pub fn new(values: Vec<Cell>) -> Self {
        Self { values }
    }

    /// Returns the row values in column order.
    pub fn values(&self) -> &[Cell] {
        &self.values
    }

    /// Consumes the row and returns its values in column order.
    pub fn into_values(self) -> Vec<Cell> {
        self.values
    }
}

/// An in-memory table with named, typed columns and an ordered sequence of rows.
///
/// Every row has one value per column, and every non-null value matches the type of its column.
/// Both properties are checked on construction, so consumers can index rows by column position.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<ColumnSchema>,
    rows: Vec<TableRow>,
}

impl Dataset {
    /// Creates a dataset, validating every row against `columns`.
    pub fn new(columns: Vec<ColumnSchema>, rows: Vec<TableRow>) -> EtlResult<Self> {
        for (row_index, row) in rows.iter().enumerate() {
            if row.values().len() != columns.len() {
                bail!(
                    ErrorKind::DatasetShapeMismatch,
                    "Row width does not match the dataset columns",
                    format!(
                        "row {row_index} has {} values, expected {}",
                        row.values().len(),
                        columns.len()
                    )
                );
            }

            for (cell, column) in row.values().iter().zip(&columns) {
                let Some(data_type) = cell.data_type() else {
                    continue;
                };

                if data_type != column.data_type {
                    bail!(
                        ErrorKind::InvalidData,
                        "Value type does not match the column type",
                        format!(
                            "row {row_index}, column `{}`: expected {}, got {data_type}",
                            column.name, column.data_type
                        )
                    );
                }
            }
        }

        Ok(Self { columns, rows })
    }

    /// Creates a dataset with `columns` and no rows.
    pub fn empty(columns: Vec<ColumnSchema>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Returns the position of the column called `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    /// Returns the schema of the column called `name`.
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Returns a dataset with `values` stored under `column`.
    ///
    /// An existing column with the same name is replaced in place, otherwise the column is
    /// appended. `values` must hold one cell per row.
    pub fn with_column(self, column: ColumnSchema, values: Vec<Cell>) -> EtlResult<Self> {
        if values.len() != self.rows.len() {
            bail!(
                ErrorKind::DatasetShapeMismatch,
                "Column length does not match the dataset rows",
                format!(
                    "column `{}` has {} values, expected {}",
                    column.name,
                    values.len(),
                    self.rows.len()
                )
            );
        }

        let Dataset { mut columns, rows } = self;
        let existing = columns.iter().position(|c| c.name == column.name);

        let rows = rows
            .into_iter()
            .zip(values)
            .map(|(row, value)| {
                let mut cells = row.into_values();
                match existing {
                    Some(index) => cells[index] = value,
                    None => cells.push(value),
                }
                TableRow::new(cells)
            })
            .collect();

        match existing {
            Some(index) => columns[index] = column,
            None => columns.push(column),
        }

        Dataset::new(columns, rows)
    }

    /// Consumes the dataset, returning its columns and rows.
    pub fn into_parts(self) -> (Vec<ColumnSchema>, Vec<TableRow>) {
        (self.columns, self.rows)
    }
}
