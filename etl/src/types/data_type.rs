use std::fmt;

/// Column type of a [`crate::types::Dataset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Bool,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    Date,
    Timestamp,
    TimestampTz,
    Bytes,
}

/// Closed classification of column types used to pick a destination type.
///
/// Booleans form their own category and are never grouped with integers. Dates are temporal and
/// share the category of timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnCategory {
    Integer,
    Float,
    Boolean,
    Timestamp,
    Other,
}

impl DataType {
    /// Returns the [`ColumnCategory`] of this type.
    pub fn category(&self) -> ColumnCategory {
        match self {
            DataType::Bool => ColumnCategory::Boolean,
            DataType::Int16 | DataType::Int32 | DataType::Int64 => ColumnCategory::Integer,
            DataType::Float32 | DataType::Float64 => ColumnCategory::Float,
            DataType::Date | DataType::Timestamp | DataType::TimestampTz => {
                ColumnCategory::Timestamp
            }
            DataType::String | DataType::Bytes => ColumnCategory::Other,
        }
    }

    /// Returns the DuckDB SQL type used to store a column of this type.
    pub fn duckdb_type(&self) -> &'static str {
        match self {
            DataType::Bool => "BOOLEAN",
            DataType::Int16 => "SMALLINT",
            DataType::Int32 => "INTEGER",
            DataType::Int64 => "BIGINT",
            DataType::Float32 => "FLOAT",
            DataType::Float64 => "DOUBLE",
            DataType::String => "VARCHAR",
            DataType::Date => "DATE",
            DataType::Timestamp => "TIMESTAMP",
            DataType::TimestampTz => "TIMESTAMPTZ",
            DataType::Bytes => "BLOB",
        }
    }

    /// Maps a DuckDB type name, as reported by `DESCRIBE`, to the type it is read as.
    ///
    /// Returns the [`DataType`] together with whether the column has to be cast to
    /// [`DataType::duckdb_type`] before it can be read. Types without a native counterpart are
    /// widened (small and unsigned integers to a signed integer that holds them, 128-bit integers
    /// and decimals to double) or rendered as text.
    pub fn from_duckdb_type(duckdb_type: &str) -> (DataType, bool) {
        let normalized = duckdb_type.trim().to_ascii_uppercase();

        let native = match normalized.as_str() {
            "BOOLEAN" => Some(DataType::Bool),
            "SMALLINT" => Some(DataType::Int16),
            "INTEGER" => Some(DataType::Int32),
            "BIGINT" => Some(DataType::Int64),
            "FLOAT" => Some(DataType::Float32),
            "DOUBLE" => Some(DataType::Float64),
            "VARCHAR" => Some(DataType::String),
            "DATE" => Some(DataType::Date),
            "TIMESTAMP" => Some(DataType::Timestamp),
            "TIMESTAMP WITH TIME ZONE" | "TIMESTAMPTZ" => Some(DataType::TimestampTz),
            "BLOB" => Some(DataType::Bytes),
            _ => None,
        };

        if let Some(data_type) = native {
            return (data_type, false);
        }

        let cast_to = match normalized.as_str() {
            "TINYINT" | "UTINYINT" => DataType::Int16,
            "USMALLINT" => DataType::Int32,
            "UINTEGER" | "UBIGINT" => DataType::Int64,
            "HUGEINT" | "UHUGEINT" => DataType::Float64,
            "TIMESTAMP_S" | "TIMESTAMP_MS" | "TIMESTAMP_NS" => DataType::Timestamp,
            other if other.starts_with("DECIMAL") => DataType::Float64,
            _ => DataType::String,
        };

        (cast_to, true)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Bool => "bool",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::String => "string",
            DataType::Date => "date",
            DataType::Timestamp => "timestamp",
            DataType::TimestampTz => "timestamptz",
            DataType::Bytes => "bytes",
        };

        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_is_never_an_integer() {
        assert_eq!(DataType::Bool.category(), ColumnCategory::Boolean);
        assert_eq!(DataType::Int64.category(), ColumnCategory::Integer);
    }

    #[test]
    fn test_dates_are_temporal() {
        assert_eq!(DataType::Date.category(), ColumnCategory::Timestamp);
        assert_eq!(DataType::TimestampTz.category(), ColumnCategory::Timestamp);
        assert_eq!(DataType::String.category(), ColumnCategory::Other);
    }

    #[test]
    fn test_from_duckdb_type_native() {
        assert_eq!(DataType::from_duckdb_type("BIGINT"), (DataType::Int64, false));
        assert_eq!(
            DataType::from_duckdb_type("TIMESTAMP WITH TIME ZONE"),
            (DataType::TimestampTz, false)
        );
        assert_eq!(DataType::from_duckdb_type("varchar"), (DataType::String, false));
    }

    #[test]
    fn test_from_duckdb_type_casts() {
        assert_eq!(DataType::from_duckdb_type("DECIMAL(18,3)"), (DataType::Float64, true));
        assert_eq!(DataType::from_duckdb_type("UBIGINT"), (DataType::Int64, true));
        assert_eq!(DataType::from_duckdb_type("TINYINT"), (DataType::Int16, true));
        assert_eq!(DataType::from_duckdb_type("HUGEINT"), (DataType::Float64, true));
        assert_eq!(DataType::from_duckdb_type("UHUGEINT"), (DataType::Float64, true));
        assert_eq!(DataType::from_duckdb_type("TIME"), (DataType::String, true));
        assert_eq!(DataType::from_duckdb_type("INTEGER[]"), (DataType::String, true));
    }
}
