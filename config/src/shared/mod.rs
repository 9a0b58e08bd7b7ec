//! Shared configuration types for the export pipeline.

mod base;
mod connection;
mod duckdb;
mod export;
mod models;
mod runner;

pub use base::ValidationError;
pub use connection::{
    EXPORT_PROVISIONING_OPTIONS, IntoConnectOptions, PgConnectionConfig, PgConnectionOptions,
    TlsConfig,
};
pub use duckdb::DuckDbConfig;
pub use export::ExportConfig;
pub use models::{Materialization, SeedConfig, SqlModelConfig, TransformConfig};
pub use runner::RunnerConfig;
