//! Configuration module

pub mod cli;
pub mod prep_config;

pub use cli::{CliArgs, OutputFormat};
pub use prep_config::{PlanFile, PrepConfig, PrepJob};
