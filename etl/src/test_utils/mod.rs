//! Fakes and fixtures for testing pipelines without DuckDB or Postgres.

pub mod catalog;
pub mod dataset;
pub mod session;
