//! Common types used throughout the pipeline.
//!
//! Re-exports the in-memory dataset model: cells, column types and rows.

mod cell;
mod data_type;
mod dataset;

pub use cell::*;
pub use data_type::*;
pub use dataset::*;

pub use postgres::schema::TableName;
