// ==============================================================================
// main.rs - Diversity Capture Entry Point
// ==============================================================================
// Description: Estimate how many individuals to sample to capture a target
//              share of a population's allelic diversity
// Author: Matt Barham
// Created: 2025-10-31
// Modified: 2026-10-18
// Version: 2.0.0
// ==============================================================================

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use diversity_capture::config::{SamplingConfig, DEFAULT_BATCH, DEFAULT_ITERATIONS, DEFAULT_THRESHOLD};
use diversity_capture::output::{render_report, ReportFormat};
use diversity_capture::processor::CaptureProcessor;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// VCF file (.vcf or .vcf.gz) with the genotypes of the population
    #[arg(short, long)]
    vcf: PathBuf,

    /// Text file of sample names (one per line) defining the population of interest
    #[arg(short = 'f', long)]
    sample_file: Option<PathBuf>,

    /// Number of samples drawn per bootstrap round
    #[arg(short, long, env = "DIVERSITY_BATCH", default_value_t = DEFAULT_BATCH)]
    batch: usize,

    /// Number of bootstrap iterations
    #[arg(short, long, env = "DIVERSITY_ITERATIONS", default_value_t = DEFAULT_ITERATIONS)]
    iterations: usize,

    /// Share of genomic diversity to capture (R² threshold, 0-1]
    #[arg(short, long, env = "DIVERSITY_THRESHOLD", default_value_t = DEFAULT_THRESHOLD)]
    diversity_captured: f64,

    /// Seed for reproducible runs
    #[arg(long, env = "DIVERSITY_SEED")]
    seed: Option<u64>,

    /// Worker threads (default: all cores)
    #[arg(long, env = "DIVERSITY_THREADS")]
    threads: Option<usize>,

    /// Abort if sampling takes longer than this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,
}

impl From<Args> for SamplingConfig {
    fn from(args: Args) -> Self {
        SamplingConfig {
            vcf_path: args.vcf,
            sample_file: args.sample_file,
            batch: args.batch,
            iterations: args.iterations,
            diversity_captured: args.diversity_captured,
            seed: args.seed,
            threads: args.threads,
            timeout_secs: args.timeout_secs,
        }
    }
}

fn main() -> Result<()> {
    // Load .env before clap reads env fallbacks
    dotenvy::dotenv().ok();

    // Initialize tracing (stderr, so stdout carries only the report)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "diversity_capture=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    let result = runtime.block_on(run(args));

    // Do not wait on a timed-out pipeline still unwinding on a blocking thread
    runtime.shutdown_background();
    result
}

async fn run(args: Args) -> Result<()> {
    let format = args.format;

    info!("Diversity Capture starting...");

    let config = SamplingConfig::from(args);
    let vcf_path = config.vcf_path.clone();

    let processor = CaptureProcessor::new(config).context("Invalid sampling parameters")?;

    let stats = processor
        .process()
        .await
        .with_context(|| format!("Sample size estimation failed for {}", vcf_path.display()))?;

    info!("Writing {} report", format.as_str());
    println!("{}", render_report(&stats, format));

    info!("Done");
    Ok(())
}
