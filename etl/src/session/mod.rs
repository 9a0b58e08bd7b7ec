//! Query-execution sessions that pipeline models run against.

mod base;
pub mod duckdb;

pub use base::*;
