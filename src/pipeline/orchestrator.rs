//! Preparation orchestrator
//!
//! Runs every configured split: decode images and labels, collect
//! statistics, scale pixels, write the flat array files and optionally
//! read them back. Splits run in parallel, one scoped thread each; every
//! thread opens its own files and owns its cursors, so nothing mutable is
//! shared between them.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::{debug, info, warn};

use crate::array::{difference_norm, min_max_scale, DType, Element, FlatArrayCodec, NumericBuffer};
use crate::config::{PrepConfig, PrepJob};
use crate::dataset::{IdxFile, RecordFileHeader};
use crate::metrics::{BufferStats, ByteHistogram, StatsReporter};
use crate::utils::Result;

/// Highest label value the digit datasets use
const MAX_DIGIT_LABEL: u8 = 9;

/// Stages shown on a job's progress bar
const STAGES: u64 = 6;

/// Read-back comparison of written files
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verification {
    /// L2 norm of (read - written) for the image file
    pub images_diff: f64,
    /// L2 norm of (read - written) for the label file
    pub labels_diff: f64,
}

impl Verification {
    pub fn is_exact(&self) -> bool {
        self.images_diff == 0.0 && self.labels_diff == 0.0
    }
}

/// Outcome of one prepared split
#[derive(Debug, Clone)]
pub struct JobReport {
    pub name: String,
    pub images_header: RecordFileHeader,
    pub labels_header: RecordFileHeader,
    /// Statistics of the decoded u8 pixels
    pub raw_pixel_stats: BufferStats,
    pub pixel_histogram: ByteHistogram,
    /// Statistics of the pixels as written
    pub output_pixel_stats: BufferStats,
    pub images_dtype: DType,
    pub images_out: PathBuf,
    pub image_elements: usize,
    pub label_stats: BufferStats,
    pub label_histogram: ByteHistogram,
    pub labels_out: PathBuf,
    pub label_elements: usize,
    pub verification: Option<Verification>,
    pub elapsed: Duration,
}

impl JobReport {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "images": {
                "input": self.images_header.summary(),
                "output": self.images_out.display().to_string(),
                "dtype": self.images_dtype.as_str(),
                "elements": self.image_elements,
                "raw_stats": self.raw_pixel_stats.to_json(),
                "output_stats": self.output_pixel_stats.to_json(),
                "histogram": self.pixel_histogram.to_json(),
            },
            "labels": {
                "input": self.labels_header.summary(),
                "output": self.labels_out.display().to_string(),
                "elements": self.label_elements,
                "stats": self.label_stats.to_json(),
                "histogram": self.label_histogram.to_json(),
            },
            "verification": self.verification.map(|v| serde_json::json!({
                "images_diff": v.images_diff,
                "labels_diff": v.labels_diff,
                "exact": v.is_exact(),
            })),
            "elapsed_secs": self.elapsed.as_secs_f64(),
        })
    }
}

/// Runs preparation jobs
pub struct Orchestrator {
    config: PrepConfig,
    progress: MultiProgress,
}

impl Orchestrator {
    pub fn new(config: PrepConfig) -> Self {
        let progress = if config.quiet {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };
        Self { config, progress }
    }

    pub fn config(&self) -> &PrepConfig {
        &self.config
    }

    /// Run every job, one thread per job
    ///
    /// Reports come back in job order. The first failing job's error is
    /// returned; files already written by other jobs are left in place.
    pub fn run_all(&self) -> Result<Vec<JobReport>> {
        info!("Preparing {} split(s)", self.config.jobs.len());

        let results: Vec<Result<JobReport>> = thread::scope(|scope| {
            let handles: Vec<_> = self
                .config
                .jobs
                .iter()
                .map(|job| {
                    let pb = self.progress.add(job_progress_bar(&job.name));
                    scope.spawn(move || {
                        let result = self.run_job(job, &pb);
                        match result {
                            Ok(_) => pb.finish_with_message(format!("{}: done", job.name)),
                            Err(_) => pb.abandon_with_message(format!("{}: failed", job.name)),
                        }
                        result
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect()
        });

        results.into_iter().collect()
    }

    /// Prepare a single split
    pub fn run_job(&self, job: &PrepJob, pb: &ProgressBar) -> Result<JobReport> {
        let start = Instant::now();

        // === Images ===
        pb.set_message(format!("{}: decoding images", job.name));
        let images = IdxFile::open_images(&job.images)?;
        info!("{}", images.summary());
        let pixels = images.decode_all()?;
        let images_header = images.header().clone();
        drop(images);
        pb.inc(1);

        let raw_pixel_stats = StatsReporter::summarize(&pixels)?;
        let pixel_histogram = StatsReporter::histogram(&pixels);
        debug!(
            "{}: raw pixels min={} max={} mean={:.4}",
            job.name, raw_pixel_stats.min, raw_pixel_stats.max, raw_pixel_stats.mean
        );

        pb.set_message(format!("{}: scaling", job.name));
        let (output_pixel_stats, images_dtype, image_elements, images_diff) = if self.config.normalize {
            let scaled = min_max_scale(&pixels)?;
            drop(pixels);
            pb.inc(1);
            let stats = StatsReporter::summarize(&scaled)?;
            pb.set_message(format!("{}: writing images", job.name));
            let diff = self.write_buffer(&job.images_out, &scaled)?;
            (stats, DType::Float32, scaled.len(), diff)
        } else {
            pb.inc(1);
            pb.set_message(format!("{}: writing images", job.name));
            let diff = self.write_buffer(&job.images_out, &pixels)?;
            (raw_pixel_stats, DType::Uint8, pixels.len(), diff)
        };
        pb.inc(1);

        // === Labels ===
        pb.set_message(format!("{}: decoding labels", job.name));
        let labels_file = IdxFile::open_labels(&job.labels)?;
        info!("{}", labels_file.summary());
        let labels = labels_file.decode_all()?;
        let labels_header = labels_file.header().clone();
        drop(labels_file);
        pb.inc(1);

        check_labels(job, &images_header, &labels_header, &labels);
        let label_stats = StatsReporter::summarize(&labels)?;
        let label_histogram = StatsReporter::histogram(&labels);

        pb.set_message(format!("{}: writing labels", job.name));
        let labels_diff = self.write_buffer(&job.labels_out, &labels)?;
        pb.inc(1);

        let verification = match (images_diff, labels_diff) {
            (Some(images_diff), Some(labels_diff)) => {
                let v = Verification {
                    images_diff,
                    labels_diff,
                };
                if !v.is_exact() {
                    warn!(
                        "{}: read-back differs from written data (images {}, labels {})",
                        job.name, v.images_diff, v.labels_diff
                    );
                }
                Some(v)
            }
            _ => None,
        };
        pb.inc(1);

        let elapsed = start.elapsed();
        info!(
            "{}: wrote {} and {} in {:.2}s",
            job.name,
            job.images_out.display(),
            job.labels_out.display(),
            elapsed.as_secs_f64()
        );

        Ok(JobReport {
            name: job.name.clone(),
            images_header,
            labels_header,
            raw_pixel_stats,
            pixel_histogram,
            output_pixel_stats,
            images_dtype,
            images_out: job.images_out.clone(),
            image_elements,
            label_stats,
            label_histogram,
            labels_out: job.labels_out.clone(),
            label_elements: labels.len(),
            verification,
            elapsed,
        })
    }

    /// Write `buffer`; when verifying, read it back and return the difference norm
    fn write_buffer<T: Element>(&self, path: &Path, buffer: &NumericBuffer<T>) -> Result<Option<f64>> {
        FlatArrayCodec::write(path, buffer)?;
        if !self.config.verify {
            return Ok(None);
        }

        let read: NumericBuffer<T> = FlatArrayCodec::read(path, Some(buffer.len()))?;
        Ok(Some(difference_norm(&read, buffer)))
    }
}

/// Caller-level sanity checks; these only warn
fn check_labels(
    job: &PrepJob,
    images_header: &RecordFileHeader,
    labels_header: &RecordFileHeader,
    labels: &NumericBuffer<u8>,
) {
    if images_header.item_count != labels_header.item_count {
        warn!(
            "{}: {} images but {} labels",
            job.name, images_header.item_count, labels_header.item_count
        );
    }

    let out_of_range = labels.iter().filter(|&&l| l > MAX_DIGIT_LABEL).count();
    if out_of_range > 0 {
        warn!(
            "{}: {} labels outside 0..={}",
            job.name, out_of_range, MAX_DIGIT_LABEL
        );
    }
}

fn job_progress_bar(name: &str) -> ProgressBar {
    let pb = ProgressBar::new(STAGES);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(name.to_string());
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::dataset::{IMAGE_MAGIC, LABEL_MAGIC};
    use crate::utils::{ArrayError, DatasetError, PrepError};

    fn write_idx(path: &Path, header: RecordFileHeader, payload: &[u8]) {
        let mut bytes = header.to_bytes();
        bytes.extend_from_slice(payload);
        std::fs::write(path, bytes).unwrap();
    }

    fn synthetic_split(dir: &Path, name: &str, pixels: &[u8], labels: &[u8]) -> PrepJob {
        let images_path = dir.join(format!("{}-images-idx3-ubyte", name));
        let labels_path = dir.join(format!("{}-labels-idx1-ubyte", name));
        write_idx(
            &images_path,
            RecordFileHeader {
                magic: IMAGE_MAGIC,
                item_count: (pixels.len() / 4) as u32,
                dims: vec![2, 2],
            },
            pixels,
        );
        write_idx(
            &labels_path,
            RecordFileHeader {
                magic: LABEL_MAGIC,
                item_count: labels.len() as u32,
                dims: vec![],
            },
            labels,
        );
        PrepJob::new(name, images_path, labels_path, dir)
    }

    fn config(jobs: Vec<PrepJob>, normalize: bool, verify: bool) -> PrepConfig {
        PrepConfig {
            jobs,
            normalize,
            verify,
            stats_format: OutputFormat::None,
            report_path: None,
            quiet: true,
        }
    }

    #[test]
    fn test_end_to_end_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let pixels = [0u8, 51, 102, 255, 0, 0, 255, 255, 10, 20, 30, 40];
        let job = synthetic_split(dir.path(), "tr", &pixels, &[5, 0, 4]);

        let orchestrator = Orchestrator::new(config(vec![job.clone()], true, true));
        let reports = orchestrator.run_all().unwrap();
        assert_eq!(reports.len(), 1);

        let report = &reports[0];
        assert_eq!(report.images_dtype, DType::Float32);
        assert_eq!(report.image_elements, 12);
        assert_eq!(report.label_elements, 3);
        assert_eq!(report.raw_pixel_stats.max, 255.0);
        assert_eq!(report.output_pixel_stats.min, 0.0);
        assert_eq!(report.output_pixel_stats.max, 1.0);
        assert_eq!(report.pixel_histogram.count(255), 3);
        assert_eq!(report.label_histogram.bincount(), &[1, 0, 0, 0, 1, 1]);
        assert!(report.verification.unwrap().is_exact());

        let x: NumericBuffer<f32> = FlatArrayCodec::read(&job.images_out, Some(12)).unwrap();
        assert_eq!(x.as_slice()[1], 0.2);
        assert_eq!(x.as_slice()[3], 1.0);
        let y: NumericBuffer<u8> = FlatArrayCodec::read(&job.labels_out, Some(3)).unwrap();
        assert_eq!(y.as_slice(), &[5, 0, 4]);
    }

    #[test]
    fn test_raw_pixels_without_normalize() {
        let dir = tempfile::tempdir().unwrap();
        let pixels = [1u8, 2, 3, 4];
        let job = synthetic_split(dir.path(), "te", &pixels, &[7]);

        let orchestrator = Orchestrator::new(config(vec![job.clone()], false, false));
        let reports = orchestrator.run_all().unwrap();
        assert_eq!(reports[0].images_dtype, DType::Uint8);
        assert!(reports[0].verification.is_none());

        let x: NumericBuffer<u8> = FlatArrayCodec::read(&job.images_out, Some(4)).unwrap();
        assert_eq!(x.as_slice(), &pixels);
    }

    #[test]
    fn test_parallel_splits_keep_order() {
        let dir = tempfile::tempdir().unwrap();
        let tr = synthetic_split(dir.path(), "tr", &[0, 1, 2, 3, 4, 5, 6, 7], &[1, 2]);
        let te = synthetic_split(dir.path(), "te", &[9, 8, 7, 6], &[3]);

        let orchestrator = Orchestrator::new(config(vec![tr, te], true, true));
        let reports = orchestrator.run_all().unwrap();
        let names: Vec<&str> = reports.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["tr", "te"]);
        assert_eq!(reports[0].image_elements, 8);
        assert_eq!(reports[1].image_elements, 4);
    }

    #[test]
    fn test_degenerate_images_fail() {
        let dir = tempfile::tempdir().unwrap();
        let job = synthetic_split(dir.path(), "tr", &[7, 7, 7, 7], &[1]);

        let orchestrator = Orchestrator::new(config(vec![job], true, false));
        let err = orchestrator.run_all().unwrap_err();
        assert!(matches!(
            err,
            PrepError::Array(ArrayError::DegenerateRange { .. })
        ));
    }

    #[test]
    fn test_truncated_labels_fail() {
        let dir = tempfile::tempdir().unwrap();
        let job = synthetic_split(dir.path(), "tr", &[0, 1, 2, 3], &[1]);
        // Declare more labels than the file holds
        write_idx(
            &job.labels,
            RecordFileHeader {
                magic: LABEL_MAGIC,
                item_count: 5,
                dims: vec![],
            },
            &[1, 2, 3],
        );

        let orchestrator = Orchestrator::new(config(vec![job], true, false));
        let err = orchestrator.run_all().unwrap_err();
        assert!(matches!(
            err,
            PrepError::Dataset(DatasetError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn test_swapped_inputs_fail_on_magic() {
        let dir = tempfile::tempdir().unwrap();
        let mut job = synthetic_split(dir.path(), "tr", &[0, 1, 2, 3], &[1]);
        std::mem::swap(&mut job.images, &mut job.labels);

        let orchestrator = Orchestrator::new(config(vec![job], true, false));
        let err = orchestrator.run_all().unwrap_err();
        assert!(matches!(
            err,
            PrepError::Dataset(DatasetError::BadMagicNumber {
                found: 0x801,
                expected: 0x803
            })
        ));
    }
}
