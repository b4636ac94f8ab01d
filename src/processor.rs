// ==============================================================================
// processor.rs - Sample Size Estimation Pipeline
// ==============================================================================
// Description: Loads the population, builds the reference profile and runs
//              the bootstrap trials
// Author: Matt Barham
// Created: 2025-10-31
// Modified: 2026-10-18
// Version: 3.0.0
// ==============================================================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::aggregator::TrialAggregator;
use crate::bootstrap::BootstrapTrial;
use crate::config::SamplingConfig;
use crate::error::{CaptureError, Result};
use crate::matrix::{AlleleFrequencies, GenotypeMatrix};
use crate::models::SummaryStatistics;
use crate::parsers::{read_sample_list, VcfLoader};

pub struct CaptureProcessor {
    config: SamplingConfig,
}

impl CaptureProcessor {
    /// Create a processor, rejecting invalid parameters up front
    pub fn new(config: SamplingConfig) -> Result<Self> {
        config.check()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }

    /// Main processing pipeline
    ///
    /// The trials are CPU-bound and run on a blocking thread; when a timeout
    /// is configured the run fails with `CaptureError::Timeout` once it
    /// elapses, and the blocking thread stops at its next round.
    pub async fn process(&self) -> Result<SummaryStatistics> {
        let config = self.config.clone();
        let cancel = Arc::new(AtomicBool::new(false));
        let job = {
            let cancel = Arc::clone(&cancel);
            tokio::task::spawn_blocking(move || run_pipeline_until(&config, &cancel))
        };

        let joined = match self.config.timeout_secs {
            Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), job).await {
                Ok(joined) => joined,
                Err(_) => {
                    cancel.store(true, Ordering::Relaxed);
                    warn!("Sampling exceeded {} seconds, cancelling trials", secs);
                    return Err(CaptureError::Timeout(secs));
                }
            },
            None => job.await,
        };

        joined.map_err(|e| CaptureError::Computation(format!("sampling task failed: {}", e)))?
    }
}

/// Run the whole pipeline on the current thread
pub fn run_pipeline(config: &SamplingConfig) -> Result<SummaryStatistics> {
    run_pipeline_until(config, &AtomicBool::new(false))
}

/// Run the whole pipeline, giving up once `cancel` is set
pub fn run_pipeline_until(config: &SamplingConfig, cancel: &AtomicBool) -> Result<SummaryStatistics> {
    // 1. Population of interest
    let samples = match &config.sample_file {
        Some(path) => {
            let names = read_sample_list(path)?;
            info!("Read {} sample names from {:?}", names.len(), path);
            Some(names)
        }
        None => None,
    };

    // 2. Genotypes
    info!("Loading genotypes from {:?}", config.vcf_path);
    let matrix = VcfLoader::new().with_samples(samples).load(&config.vcf_path)?;

    if cancel.load(Ordering::Relaxed) {
        return Err(CaptureError::Cancelled { round: 0 });
    }

    // 3. Reference profile over every sample kept
    let reference = reference_profile(&matrix)?;

    // 4. Bootstrap trials
    estimate_sample_size(&matrix, &reference, config, cancel)
}

/// Allele frequencies of the full population under analysis
pub fn reference_profile(matrix: &GenotypeMatrix) -> Result<AlleleFrequencies> {
    let reference = matrix.reference_frequencies()?;
    for (site, af) in matrix.sites().iter().zip(reference.values()) {
        if af.is_none() {
            debug!("No called alleles at {}, site left out of the regression", site.label());
        }
    }
    info!(
        "Reference profile: {} of {} variants called across {} samples",
        reference.defined_count(),
        reference.len(),
        matrix.sample_count()
    );
    Ok(reference)
}

/// Run the configured trials against an already loaded matrix and reference
pub fn estimate_sample_size(
    matrix: &GenotypeMatrix,
    reference: &AlleleFrequencies,
    config: &SamplingConfig,
    cancel: &AtomicBool,
) -> Result<SummaryStatistics> {
    let trial = BootstrapTrial::new(matrix, reference, config.batch, config.diversity_captured)?
        .with_cancel(cancel);

    TrialAggregator::new(trial, config.iterations)?
        .with_seed(config.seed)
        .with_threads(config.threads)
        .run()
}
