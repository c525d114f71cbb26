//! Statistics and reporting
//!
//! This module provides:
//! - Summary statistics over numeric buffers
//! - Byte-value histograms for pixels and labels
//! - Console and JSON reports of prepared splits

pub mod reporter;
pub mod stats;

pub use reporter::StatsOutput;
pub use stats::{BufferStats, ByteHistogram, StatsReporter, BYTE_BUCKETS};
