use config::shared::{Materialization, TransformConfig};
use tracing::info;

use crate::bail;
use crate::error::{ErrorKind, EtlResult};
use crate::models::{Model, ModelContext};
use crate::session::{DatasetResolver, Session};
use crate::types::{Cell, ColumnSchema, DataType, Dataset};

pub const FIRST_NAME_COLUMN: &str = "first_name";
pub const LAST_NAME_COLUMN: &str = "last_name";
pub const FULL_NAME_COLUMN: &str = "full_name";
pub const NAME_LENGTH_COLUMN: &str = "name_length";

/// Returns `dataset` with `full_name` and `name_length` columns derived from the name columns.
///
/// `full_name` is `first_name`, a single space and `last_name`; `name_length` is its length in
/// characters. A null in either name yields nulls in both derived columns. Existing columns with
/// the derived names are replaced, and no rows are added or removed.
pub fn add_name_columns(dataset: Dataset) -> EtlResult<Dataset> {
    let first_name = string_column_index(&dataset, FIRST_NAME_COLUMN)?;
    let last_name = string_column_index(&dataset, LAST_NAME_COLUMN)?;

    let mut full_names = Vec::with_capacity(dataset.num_rows());
    let mut name_lengths = Vec::with_capacity(dataset.num_rows());
    for row in dataset.rows() {
        let values = row.values();
        match (&values[first_name], &values[last_name]) {
            (Cell::String(first), Cell::String(last)) => {
                let full_name = format!("{first} {last}");
                name_lengths.push(Cell::I64(full_name.chars().count() as i64));
                full_names.push(Cell::String(full_name));
            }
            _ => {
                full_names.push(Cell::Null);
                name_lengths.push(Cell::Null);
            }
        }
    }

    dataset
        .with_column(
            ColumnSchema::new(FULL_NAME_COLUMN, DataType::String),
            full_names,
        )?
        .with_column(
            ColumnSchema::new(NAME_LENGTH_COLUMN, DataType::Int64),
            name_lengths,
        )
}

fn string_column_index(dataset: &Dataset, name: &str) -> EtlResult<usize> {
    let Some(index) = dataset.column_index(name) else {
        bail!(
            ErrorKind::MissingColumn,
            "Required column is missing",
            format!("column `{name}` not found")
        );
    };

    let data_type = dataset.columns()[index].data_type;
    if data_type != DataType::String {
        bail!(
            ErrorKind::InvalidColumnType,
            "Column must be string-typed",
            format!("column `{name}` has type {data_type}")
        );
    }

    Ok(index)
}

/// Model that adds name-derived columns to its upstream dataset.
#[derive(Debug, Clone)]
pub struct TransformModel {
    config: TransformConfig,
}

impl TransformModel {
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }
}

impl Model for TransformModel {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn run<S>(&self, ctx: &mut ModelContext<'_, S>, _session: &S) -> EtlResult<Dataset>
    where
        S: Session + DatasetResolver + Sync,
    {
        ctx.config(Materialization::Table);

        let dataset = ctx.reference(&self.config.upstream).await?;
        let dataset = add_name_columns(dataset)?;

        info!(
            model = %self.config.name,
            rows = dataset.num_rows(),
            "derived name columns"
        );

        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::dataset::people_dataset;
    use crate::test_utils::session::MemorySession;
    use crate::types::TableRow;

    #[test]
    fn test_ada_lovelace() {
        let dataset = add_name_columns(people_dataset(&[(Some("Ada"), Some("Lovelace"))])).unwrap();

        let names: Vec<&str> = dataset.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["first_name", "last_name", "full_name", "name_length"]);
        assert_eq!(
            dataset.rows()[0].values(),
            &[
                Cell::from("Ada"),
                Cell::from("Lovelace"),
                Cell::from("Ada Lovelace"),
                Cell::I64(12),
            ]
        );
    }

    #[test]
    fn test_length_counts_characters() {
        let dataset = add_name_columns(people_dataset(&[(Some("Zoë"), Some("Ångström"))])).unwrap();

        assert_eq!(dataset.rows()[0].values()[3], Cell::I64(12));
    }

    #[test]
    fn test_every_row_is_derived() {
        let input = people_dataset(&[
            (Some("Grace"), Some("Hopper")),
            (Some(""), Some("")),
            (None, Some("Turing")),
        ]);

        let dataset = add_name_columns(input).unwrap();

        assert_eq!(dataset.num_rows(), 3);
        for row in dataset.rows() {
            let values = row.values();
            match (&values[0], &values[1]) {
                (Cell::String(first), Cell::String(last)) => {
                    let expected = format!("{first} {last}");
                    assert_eq!(
                        values[3],
                        Cell::I64(expected.chars().count() as i64)
                    );
                    assert_eq!(values[2], Cell::String(expected));
                }
                _ => assert_eq!(&values[2..], &[Cell::Null, Cell::Null]),
            }
        }
    }

    #[test]
    fn test_existing_derived_columns_are_replaced() {
        let input = people_dataset(&[(Some("Ada"), Some("Lovelace"))])
            .with_column(
                ColumnSchema::new(FULL_NAME_COLUMN, DataType::String),
                vec![Cell::from("stale")],
            )
            .unwrap();

        let dataset = add_name_columns(input).unwrap();

        assert_eq!(dataset.columns().len(), 4);
        assert_eq!(dataset.rows()[0].values()[2], Cell::from("Ada Lovelace"));
    }

    #[test]
    fn test_missing_column() {
        let input = Dataset::new(
            vec![ColumnSchema::new("first_name", DataType::String)],
            vec![TableRow::new(vec![Cell::from("Ada")])],
        )
        .unwrap();

        let err = add_name_columns(input).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MissingColumn);
        assert_eq!(err.detail(), Some("column `last_name` not found"));
    }

    #[test]
    fn test_non_string_column() {
        let input = Dataset::new(
            vec![
                ColumnSchema::new("first_name", DataType::String),
                ColumnSchema::new("last_name", DataType::Int64),
            ],
            vec![],
        )
        .unwrap();

        let err = add_name_columns(input).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidColumnType);
    }

    #[tokio::test]
    async fn test_model_reads_upstream_and_sets_table_materialization() {
        let session = MemorySession::new();
        session.insert_relation(
            "my_seed_data",
            people_dataset(&[(Some("Ada"), Some("Lovelace"))]),
        );
        let model = TransformModel::new(TransformConfig {
            name: "my_python_model".to_string(),
            upstream: "my_seed_data".to_string(),
        });
        let mut ctx = ModelContext::new(&session);
        ctx.config(Materialization::View);

        let dataset = model.run(&mut ctx, &session).await.unwrap();

        assert_eq!(dataset.num_rows(), 1);
        assert_eq!(ctx.references(), ["my_seed_data".to_string()]);
        assert_eq!(ctx.model_config().materialized, Materialization::Table);
    }
}
