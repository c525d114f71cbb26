//! Command-line argument parsing
//!
//! Two modes: prepare (decode IDX files and write flat arrays, from
//! `--images/--labels` or a `--plan` file) and inspect (read a flat array
//! back with a given dtype and print its statistics).

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::array::DType;

/// Convert IDX image/label datasets into flat native-endian arrays
#[derive(Parser, Debug, Clone)]
#[command(name = "idx-prep")]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    // ===== Inputs =====
    /// IDX image file (magic 0x00000803), already decompressed
    #[arg(long = "images")]
    pub images: Option<PathBuf>,

    /// IDX label file (magic 0x00000801), already decompressed
    #[arg(long = "labels")]
    pub labels: Option<PathBuf>,

    /// Split name used in output file names (X_<split>.dat, y_<split>.dat)
    #[arg(long = "split", default_value = "tr")]
    pub split: String,

    /// YAML plan describing several splits to prepare
    #[arg(long = "plan", conflicts_with_all = ["images", "labels"])]
    pub plan: Option<PathBuf>,

    // ===== Output =====
    /// Directory for the flat array files
    #[arg(short = 'o', long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,

    /// Write raw uint8 pixels instead of min-max scaled float32
    #[arg(long = "no-normalize")]
    pub no_normalize: bool,

    /// Read every written file back and compare with what was written
    #[arg(long = "verify")]
    pub verify: bool,

    /// Statistics output format
    #[arg(long = "stats", value_enum, default_value_t = OutputFormat::Console)]
    pub stats: OutputFormat,

    /// Write a JSON report of every prepared split to this file
    #[arg(long = "report")]
    pub report: Option<PathBuf>,

    // ===== Inspect Mode =====
    /// Read a flat array file and print its statistics
    #[arg(long = "inspect", conflicts_with_all = ["images", "labels", "plan"])]
    pub inspect: Option<PathBuf>,

    /// Element type of the inspected file (not stored in the file)
    #[arg(long = "dtype", value_enum, default_value_t = DType::Float32)]
    pub dtype: DType,

    /// Expected element count of the inspected file
    #[arg(long = "count")]
    pub count: Option<usize>,

    // ===== Logging =====
    /// Verbose logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Errors only, no progress bars
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Statistics output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Console,
    Json,
    None,
}

impl CliArgs {
    /// Parse arguments from the process command line
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if self.inspect.is_some() {
            return Ok(());
        }

        if self.plan.is_none() {
            match (&self.images, &self.labels) {
                (Some(_), Some(_)) => {}
                (None, None) => {
                    return Err("Either --plan, --inspect or --images with --labels is required"
                        .to_string())
                }
                (Some(_), None) => return Err("--images requires --labels".to_string()),
                (None, Some(_)) => return Err("--labels requires --images".to_string()),
            }
        }

        validate_split_name(&self.split)?;

        if self.count.is_some() {
            return Err("--count only applies to --inspect".to_string());
        }

        Ok(())
    }

    /// True when running in inspect mode
    pub fn is_inspect(&self) -> bool {
        self.inspect.is_some()
    }
}

/// Reject split names that are empty or contain a path separator
///
/// The name becomes part of the output file names, which must stay
/// inside the output directory.
pub fn validate_split_name(name: &str) -> Result<(), String> {
    if name.is_empty() || name.contains(|c: char| c == '/' || c == '\\') {
        return Err(format!("Invalid split name: {:?}", name));
    }
    Ok(())
}
