//! Pipeline models and the context they run in.

mod base;
pub mod export;
pub mod transform;

pub use base::*;
