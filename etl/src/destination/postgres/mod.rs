//! Postgres destination: type mapping, catalog access and table provisioning.

mod catalog;
mod provision;
mod schema;

pub use catalog::*;
pub use provision::*;
pub use schema::*;
