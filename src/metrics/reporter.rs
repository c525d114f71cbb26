//! Report output - console and JSON formatting
//!
//! Renders statistics of single buffers (inspect mode) and of prepared
//! splits, and writes the JSON report file.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use super::stats::{BufferStats, ByteHistogram};
use crate::array::DType;
use crate::config::OutputFormat;
use crate::pipeline::JobReport;

/// Report printer for a chosen output format
pub struct StatsOutput {
    format: OutputFormat,
}

impl StatsOutput {
    /// Create new reporter with specified format
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Report statistics of one flat array file
    pub fn report_buffer(&self, label: &str, dtype: DType, stats: &BufferStats) {
        match self.format {
            OutputFormat::Console => {
                println!("\n=== {} ({}) ===", label, dtype);
                print_stats_console(stats);
            }
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "file": label,
                    "dtype": dtype.as_str(),
                    "stats": stats.to_json(),
                });
                print_json(&json);
            }
            OutputFormat::None => {}
        }
    }

    /// Report every prepared split
    pub fn report_jobs(&self, reports: &[JobReport]) {
        match self.format {
            OutputFormat::Console => {
                for report in reports {
                    report_job_console(report);
                }
            }
            OutputFormat::Json => print_json(&jobs_to_json(reports)),
            OutputFormat::None => {}
        }
    }

    /// Write the JSON report of every split to `path`
    pub fn write_json_file(&self, path: &Path, reports: &[JobReport]) -> io::Result<()> {
        let text = serde_json::to_string_pretty(&jobs_to_json(reports))?;
        let mut file = File::create(path)?;
        writeln!(file, "{}", text)?;
        Ok(())
    }
}

fn jobs_to_json(reports: &[JobReport]) -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "splits": reports.iter().map(JobReport::to_json).collect::<Vec<_>>(),
    })
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => tracing::error!("Failed to render JSON: {}", e),
    }
}

fn print_stats_console(stats: &BufferStats) {
    println!("  count:  {}", stats.count);
    println!("  min:    {:.6}", stats.min);
    println!("  max:    {:.6}", stats.max);
    println!("  mean:   {:.6}", stats.mean);
    println!("  median: {:.6}", stats.median);
    println!("  stddev: {:.6}", stats.stddev);
}

fn report_job_console(report: &JobReport) {
    println!("\n=== {} ===", report.name);
    println!("Images: {}", report.images_header.summary());
    println!("Labels: {}", report.labels_header.summary());

    println!("\nRaw pixels (uint8):");
    print_stats_console(&report.raw_pixel_stats);
    println!(
        "  zero pixels: {} of {}",
        report.pixel_histogram.count(0),
        report.pixel_histogram.total()
    );

    println!("\nOutput pixels ({}):", report.images_dtype);
    print_stats_console(&report.output_pixel_stats);

    println!("\nLabels:");
    print_stats_console(&report.label_stats);
    print_label_counts(&report.label_histogram);

    println!("\nOutputs:");
    println!(
        "  {} ({} x {})",
        report.images_out.display(),
        report.image_elements,
        report.images_dtype
    );
    println!(
        "  {} ({} x uint8)",
        report.labels_out.display(),
        report.label_elements
    );

    if let Some(v) = report.verification {
        let status = if v.is_exact() { "OK" } else { "MISMATCH" };
        println!(
            "  verify: {} (images diff {:.3e}, labels diff {:.3e})",
            status, v.images_diff, v.labels_diff
        );
    }
    println!("  elapsed: {:.2}s", report.elapsed.as_secs_f64());
}

fn print_label_counts(histogram: &ByteHistogram) {
    println!("  {:>6} {:>10}", "label", "count");
    for (value, count) in histogram.bincount().iter().enumerate() {
        println!("  {:>6} {:>10}", value, count);
    }
}
