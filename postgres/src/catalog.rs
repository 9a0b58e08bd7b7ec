use tokio_postgres::Client;

use crate::schema::TableName;

/// Checks `information_schema.tables` for a table in the given schema.
///
/// The lookup is case-sensitive, so a table created as `"Final_Output"` does not satisfy a lookup
/// for `final_output`.
pub async fn table_exists(
    client: &Client,
    table_name: &TableName,
) -> Result<bool, tokio_postgres::Error> {
    let row = client
        .query_one(
            "select exists (
                select from information_schema.tables
                where table_schema = $1
                and table_name = $2
            )",
            &[&table_name.schema, &table_name.name],
        )
        .await?;

    row.try_get(0)
}
