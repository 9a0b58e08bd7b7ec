//! Postgres connectivity used to provision the export destination.

pub mod catalog;
pub mod schema;
pub mod client;
#[cfg(feature = "test-utils")]
pub mod test_utils;
