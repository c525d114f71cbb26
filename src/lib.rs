//! idx-prep library
//!
//! Decodes IDX image/label datasets, scales pixels and writes headerless
//! native-endian arrays for numeric code to load directly.

pub mod array;
pub mod config;
pub mod dataset;
pub mod metrics;
pub mod pipeline;
pub mod utils;
