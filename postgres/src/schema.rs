use std::fmt;

use pg_escape::quote_identifier;

/// Fully qualified Postgres table name with schema and table components.
#[derive(Debug, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TableName {
    /// The schema name containing the table.
    pub schema: String,
    /// The name of the table within the schema.
    pub name: String,
}

impl TableName {
    /// Creates a new [`TableName`] with the given schema and table name.
    pub fn new(schema: String, name: String) -> TableName {
        Self { schema, name }
    }

    /// Returns the table name as a quoted, schema-qualified Postgres identifier.
    ///
    /// Components are only quoted when Postgres would otherwise fold or reject them.
    pub fn as_quoted_identifier(&self) -> String {
        let quoted_schema = quote_identifier(&self.schema);
        let quoted_name = quote_identifier(&self.name);

        format!("{quoted_schema}.{quoted_name}")
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// Quotes `identifier` with double quotes unconditionally, doubling embedded quotes.
///
/// Unlike [`quote_identifier`], simple lowercase names are quoted too, which keeps generated DDL
/// independent of the keyword list of the server version.
pub fn quote_identifier_always(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
