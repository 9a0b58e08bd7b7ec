use pg_escape::quote_identifier;
use postgres::schema::quote_identifier_always;

use crate::types::{ColumnCategory, ColumnSchema, TableName};

/// Schema that unqualified table names resolve to.
const DEFAULT_SCHEMA: &str = "public";

/// Returns the Postgres type token for a [`ColumnCategory`].
///
/// The mapping is total: every category has exactly one destination type.
pub fn postgres_type(category: ColumnCategory) -> &'static str {
    match category {
        ColumnCategory::Integer => "BIGINT",
        ColumnCategory::Float => "DOUBLE PRECISION",
        ColumnCategory::Boolean => "BOOLEAN",
        ColumnCategory::Timestamp => "TIMESTAMP",
        ColumnCategory::Other => "TEXT",
    }
}

/// Renders `table_name` for use in Postgres statements.
///
/// Tables in the `public` schema are rendered without a schema qualifier.
pub fn render_table_name(table_name: &TableName) -> String {
    if table_name.schema == DEFAULT_SCHEMA {
        quote_identifier(&table_name.name).to_string()
    } else {
        table_name.as_quoted_identifier()
    }
}

/// Renders `table_name` as seen through a database attached to DuckDB under `alias`.
pub fn render_attached_table_name(alias: &str, table_name: &TableName) -> String {
    format!(
        "{}.{}",
        quote_identifier(alias),
        render_table_name(table_name)
    )
}

/// Builds the `CREATE TABLE` statement for a dataset with `columns`.
///
/// Column names are always quoted, type tokens are inserted verbatim and column order is kept.
pub fn build_create_table_sql(table_name: &TableName, columns: &[ColumnSchema]) -> String {
    let column_defs: Vec<String> = columns
        .iter()
        .map(|column| {
            format!(
                "{} {}",
                quote_identifier_always(&column.name),
                postgres_type(column.data_type.category())
            )
        })
        .collect();

    format!(
        "CREATE TABLE {} ({})",
        render_table_name(table_name),
        column_defs.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;

    fn final_output() -> TableName {
        TableName::new("public".to_string(), "final_output".to_string())
    }

    #[test]
    fn test_type_mapping() {
        assert_eq!(postgres_type(DataType::Int16.category()), "BIGINT");
        assert_eq!(postgres_type(DataType::Int64.category()), "BIGINT");
        assert_eq!(postgres_type(DataType::Float32.category()), "DOUBLE PRECISION");
        assert_eq!(postgres_type(DataType::Bool.category()), "BOOLEAN");
        assert_eq!(postgres_type(DataType::Timestamp.category()), "TIMESTAMP");
        assert_eq!(postgres_type(DataType::TimestampTz.category()), "TIMESTAMP");
        assert_eq!(postgres_type(DataType::String.category()), "TEXT");
        assert_eq!(postgres_type(DataType::Date.category()), "TIMESTAMP");
        assert_eq!(postgres_type(DataType::Bytes.category()), "TEXT");
    }

    #[test]
    fn test_create_table_sql_keeps_column_order() {
        let columns = vec![
            ColumnSchema::new("id", DataType::Int64),
            ColumnSchema::new("score", DataType::Float64),
            ColumnSchema::new("active", DataType::Bool),
        ];

        assert_eq!(
            build_create_table_sql(&final_output(), &columns),
            r#"CREATE TABLE final_output ("id" BIGINT, "score" DOUBLE PRECISION, "active" BOOLEAN)"#
        );
    }

    #[test]
    fn test_create_table_sql_maps_dates_to_timestamp() {
        let columns = vec![
            ColumnSchema::new("id", DataType::Int64),
            ColumnSchema::new("d", DataType::Date),
        ];

        assert_eq!(
            build_create_table_sql(&final_output(), &columns),
            r#"CREATE TABLE final_output ("id" BIGINT, "d" TIMESTAMP)"#
        );
    }

    #[test]
    fn test_create_table_sql_quotes_hostile_column_names() {
        let columns = vec![ColumnSchema::new(r#"x" text); drop table t; --"#, DataType::String)];

        assert_eq!(
            build_create_table_sql(&final_output(), &columns),
            r#"CREATE TABLE final_output ("x"" text); drop table t; --" TEXT)"#
        );
    }

    #[test]
    fn test_table_names_outside_public_are_qualified() {
        let table = TableName::new("analytics".to_string(), "Final Output".to_string());

        assert_eq!(render_table_name(&table), r#"analytics."Final Output""#);
        assert_eq!(
            render_attached_table_name("mydb", &table),
            r#"mydb.analytics."Final Output""#
        );
        assert_eq!(
            render_attached_table_name("mydb", &final_output()),
            "mydb.final_output"
        );
    }
}
