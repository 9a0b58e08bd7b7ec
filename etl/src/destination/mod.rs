//! Destinations that exported datasets are written to.

pub mod postgres;
