use crate::types::{Cell, ColumnSchema, DataType, Dataset, TableRow};

/// Builds a dataset of string columns from `(first_name, last_name)` pairs.
pub fn people_dataset(names: &[(Option<&str>, Option<&str>)]) -> Dataset {
    let rows = names
        .iter()
        .map(|(first_name, last_name)| {
            TableRow::new(vec![Cell::from(*first_name), Cell::from(*last_name)])
        })
        .collect();

    Dataset::new(
        vec![
            ColumnSchema::new("first_name", DataType::String),
            ColumnSchema::new("last_name", DataType::String),
        ],
        rows,
    )
    .expect("people rows match their columns")
}

/// Builds the `(id: int64, score: float64, active: bool)` dataset with `num_rows` rows.
pub fn scores_dataset_with_rows(num_rows: i64) -> Dataset {
    let rows = (1..=num_rows)
        .map(|id| {
            TableRow::new(vec![
                Cell::I64(id),
                Cell::F64(id as f64 / 2.0),
                Cell::Bool(id % 2 == 0),
            ])
        })
        .collect();

    Dataset::new(
        vec![
            ColumnSchema::new("id", DataType::Int64),
            ColumnSchema::new("score", DataType::Float64),
            ColumnSchema::new("active", DataType::Bool),
        ],
        rows,
    )
    .expect("score rows match their columns")
}

/// Builds the `(id: int64, score: float64, active: bool)` dataset with three rows.
pub fn scores_dataset() -> Dataset {
    scores_dataset_with_rows(3)
}
