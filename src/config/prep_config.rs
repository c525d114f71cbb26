//! Preparation configuration
//!
//! A run is a list of jobs, one per dataset split. Jobs come either from
//! a single `--images/--labels` pair on the command line or from a YAML
//! plan file:
//!
//! ```yaml
//! version: 1
//! output_dir: data/MNIST
//! verify: true
//! jobs:
//!   - name: tr
//!     images: data/MNIST/train-images-idx3-ubyte
//!     labels: data/MNIST/train-labels-idx1-ubyte
//!   - name: te
//!     images: data/MNIST/t10k-images-idx3-ubyte
//!     labels: data/MNIST/t10k-labels-idx1-ubyte
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::cli::{validate_split_name, CliArgs, OutputFormat};
use crate::utils::ConfigError;

/// Current plan file version
pub const PLAN_VERSION: u32 = 1;

fn default_true() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// One split as written in a plan file
#[derive(Debug, Clone, Deserialize)]
pub struct JobDef {
    /// Split name (tr, te, ...)
    pub name: String,

    /// IDX image file
    pub images: PathBuf,

    /// IDX label file
    pub labels: PathBuf,

    /// Override for the image output path (default X_<name>.dat)
    pub images_out: Option<PathBuf>,

    /// Override for the label output path (default y_<name>.dat)
    pub labels_out: Option<PathBuf>,
}

/// Plan file contents
#[derive(Debug, Clone, Deserialize)]
pub struct PlanFile {
    /// Plan version
    pub version: u32,

    /// Directory for outputs without an explicit path
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Min-max scale pixels to float32
    #[serde(default = "default_true")]
    pub normalize: bool,

    /// Read outputs back and compare
    #[serde(default)]
    pub verify: bool,

    pub jobs: Vec<JobDef>,
}

impl PlanFile {
    /// Load plan from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.as_ref().display(), e)))?;

        Self::from_yaml(&content)
    }

    /// Parse plan from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let plan: PlanFile =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;

        if plan.version > PLAN_VERSION {
            return Err(ConfigError::UnsupportedVersion(plan.version));
        }

        if plan.jobs.is_empty() {
            return Err(ConfigError::Invalid("Plan has no jobs".to_string()));
        }

        {
            let mut names = HashSet::new();
            for job in &plan.jobs {
                validate_split_name(&job.name).map_err(ConfigError::Invalid)?;
                if !names.insert(job.name.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "Duplicate job name: {}",
                        job.name
                    )));
                }
            }
        }

        Ok(plan)
    }
}

/// A fully resolved split: inputs and output paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepJob {
    pub name: String,
    pub images: PathBuf,
    pub labels: PathBuf,
    pub images_out: PathBuf,
    pub labels_out: PathBuf,
}

impl PrepJob {
    /// Resolve output paths following the X_<name>.dat / y_<name>.dat convention
    pub fn new(name: &str, images: PathBuf, labels: PathBuf, output_dir: &Path) -> Self {
        Self {
            name: name.to_string(),
            images,
            labels,
            images_out: output_dir.join(format!("X_{}.dat", name)),
            labels_out: output_dir.join(format!("y_{}.dat", name)),
        }
    }

    fn from_def(def: &JobDef, output_dir: &Path) -> Self {
        let mut job = Self::new(&def.name, def.images.clone(), def.labels.clone(), output_dir);
        if let Some(ref path) = def.images_out {
            job.images_out = path.clone();
        }
        if let Some(ref path) = def.labels_out {
            job.labels_out = path.clone();
        }
        job
    }
}

/// Complete run configuration
#[derive(Debug, Clone)]
pub struct PrepConfig {
    pub jobs: Vec<PrepJob>,
    pub normalize: bool,
    pub verify: bool,
    pub stats_format: OutputFormat,
    pub report_path: Option<PathBuf>,
    pub quiet: bool,
}

impl PrepConfig {
    /// Build configuration from CLI arguments, loading the plan if given
    ///
    /// Command-line `--verify` and `--no-normalize` apply on top of the plan.
    pub fn from_cli(args: &CliArgs) -> Result<Self, ConfigError> {
        args.validate().map_err(ConfigError::Invalid)?;

        let (jobs, normalize, verify) = if let Some(ref plan_path) = args.plan {
            let plan = PlanFile::load(plan_path)?;
            let jobs = plan
                .jobs
                .iter()
                .map(|def| PrepJob::from_def(def, &plan.output_dir))
                .collect();
            (jobs, plan.normalize, plan.verify)
        } else {
            // validate() guarantees both are set here
            let (images, labels) = match (&args.images, &args.labels) {
                (Some(images), Some(labels)) => (images.clone(), labels.clone()),
                _ => {
                    return Err(ConfigError::Invalid(
                        "--images and --labels are required".to_string(),
                    ))
                }
            };
            let job = PrepJob::new(&args.split, images, labels, &args.output_dir);
            (vec![job], true, false)
        };

        Ok(Self {
            jobs,
            normalize: normalize && !args.no_normalize,
            verify: verify || args.verify,
            stats_format: args.stats,
            report_path: args.report.clone(),
            quiet: args.quiet,
        })
    }
}
