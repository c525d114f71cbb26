//! Utility modules

pub mod error;

pub use error::{ArrayError, ConfigError, DatasetError, PrepError, Result};
