//! idx-prep - convert IDX datasets into flat numeric arrays
//!
//! Decodes IDX image and label files, min-max scales the pixels and
//! writes headerless native-endian arrays, one pair per dataset split.

use anyhow::{Context, Result};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use idx_prep::array::{FlatArray, FlatArrayCodec};
use idx_prep::config::{CliArgs, OutputFormat, PrepConfig};
use idx_prep::metrics::{StatsOutput, StatsReporter};
use idx_prep::pipeline::Orchestrator;

fn setup_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn print_banner(config: &PrepConfig) {
    if config.quiet {
        return;
    }

    println!("idx-prep v{}", env!("CARGO_PKG_VERSION"));
    println!("====================================");
    for job in &config.jobs {
        println!(
            "{}: {} + {} -> {}, {}",
            job.name,
            job.images.display(),
            job.labels.display(),
            job.images_out.display(),
            job.labels_out.display()
        );
    }
    println!(
        "Normalize: {}, Verify: {}",
        config.normalize, config.verify
    );
    println!("====================================\n");
}

fn run_inspect(args: &CliArgs) -> Result<()> {
    let Some(ref path) = args.inspect else {
        return Ok(());
    };

    info!("Inspecting {:?} as {}", path, args.dtype);
    let array = FlatArrayCodec::read_dtype(path, args.dtype, args.count)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let stats = match array {
        FlatArray::Uint8(ref buffer) => StatsReporter::summarize(buffer)?,
        FlatArray::Float32(ref buffer) => StatsReporter::summarize(buffer)?,
    };

    let output = StatsOutput::new(args.stats);
    output.report_buffer(&path.display().to_string(), array.dtype(), &stats);
    Ok(())
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse_args();

    // Setup logging
    setup_logging(args.verbose, args.quiet);

    if args.is_inspect() {
        return run_inspect(&args);
    }

    // Build configuration
    let config = PrepConfig::from_cli(&args)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    print_banner(&config);

    let output = StatsOutput::new(config.stats_format);
    let report_path = config.report_path.clone();
    let quiet = config.quiet;

    let orchestrator = Orchestrator::new(config);
    let reports = orchestrator.run_all()?;

    output.report_jobs(&reports);

    if let Some(ref path) = report_path {
        info!("Writing report to: {:?}", path);
        output
            .write_json_file(path, &reports)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
    }

    if !quiet && output.format() != OutputFormat::Json {
        println!("\n====================================");
        println!("PREPARATION COMPLETE");
        println!("====================================");
        println!("Splits: {}", reports.len());
        let images: usize = reports.iter().map(|r| r.image_elements).sum();
        let labels: usize = reports.iter().map(|r| r.label_elements).sum();
        println!("Image elements written: {}", images);
        println!("Label elements written: {}", labels);
    }

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}
