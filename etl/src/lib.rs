//! Models, sessions and destination provisioning for exporting DuckDB datasets to Postgres.
//!
//! A [`pipeline::Pipeline`] runs seeds and models against a [`session::Session`]. The
//! [`models::transform::TransformModel`] derives name columns from its upstream dataset, and the
//! [`models::export::ExportModel`] copies a dataset into a Postgres table through DuckDB's
//! `postgres` extension, creating the table on first use.

pub mod destination;
pub mod error;
mod macros;
pub mod models;
pub mod pipeline;
pub mod session;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
