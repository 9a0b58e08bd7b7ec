use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::types::DataType;

/// A single value of a [`crate::types::Dataset`] row.
///
/// Every non-null variant corresponds to exactly one [`DataType`].
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Bytes(Vec<u8>),
}

impl Cell {
    /// Returns the [`DataType`] of this cell, or `None` for [`Cell::Null`].
    pub fn data_type(&self) -> Option<DataType> {
        let data_type = match self {
            Cell::Null => return None,
            Cell::Bool(_) => DataType::Bool,
            Cell::I16(_) => DataType::Int16,
            Cell::I32(_) => DataType::Int32,
            Cell::I64(_) => DataType::Int64,
            Cell::F32(_) => DataType::Float32,
            Cell::F64(_) => DataType::Float64,
            Cell::String(_) => DataType::String,
            Cell::Date(_) => DataType::Date,
            Cell::Timestamp(_) => DataType::Timestamp,
            Cell::TimestampTz(_) => DataType::TimestampTz,
            Cell::Bytes(_) => DataType::Bytes,
        };

        Some(data_type)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Returns the string value if this is a [`Cell::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::String(value) => Some(value),
            _ => None,
        }
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Cell::I32(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::I64(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::F64(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::String(value.to_owned())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::String(value)
    }
}

impl From<NaiveDateTime> for Cell {
    fn from(value: NaiveDateTime) -> Self {
        Cell::Timestamp(value)
    }
}

impl<T> From<Option<T>> for Cell
where
    T: Into<Cell>,
{
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_of_cells() {
        assert_eq!(Cell::Null.data_type(), None);
        assert_eq!(Cell::Bool(true).data_type(), Some(DataType::Bool));
        assert_eq!(Cell::from(12i64).data_type(), Some(DataType::Int64));
        assert_eq!(Cell::from("Ada").data_type(), Some(DataType::String));
    }

    #[test]
    fn test_optional_values_become_null() {
        assert_eq!(Cell::from(None::<&str>), Cell::Null);
        assert_eq!(Cell::from(Some(1.5)), Cell::F64(1.5));
    }
}
