//! Dataset preparation pipeline

pub mod orchestrator;

pub use orchestrator::{JobReport, Orchestrator, Verification};
