//! Configuration types and loading for the export pipeline.
//!
//! Configuration is read from `configuration/base.*`, then `configuration/{environment}.*`, then
//! `APP_`-prefixed environment variables, see [`load_config`].

mod environment;
mod load;
pub mod shared;

pub use environment::Environment;
pub use load::{Config, LoadConfigError, load_config, load_config_from};
