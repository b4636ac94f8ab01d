// ==============================================================================
// config.rs - Sampling Run Configuration
// ==============================================================================
// Description: Validated parameters for one sample-size estimation run
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use validator::{Validate, ValidationError};

use crate::error::CaptureError;

pub const DEFAULT_BATCH: usize = 5;
pub const DEFAULT_ITERATIONS: usize = 100;
pub const DEFAULT_THRESHOLD: f64 = 0.9;

/// Accepted genotype file extensions
const VCF_EXTENSIONS: [&str; 3] = [".vcf", ".vcf.gz", ".vcf.bgz"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SamplingConfig {
    /// Genotype file (VCF, optionally bgzipped)
    #[validate(custom(function = "validate_vcf_path"))]
    pub vcf_path: PathBuf,

    /// Optional list of samples forming the population of interest
    pub sample_file: Option<PathBuf>,

    /// Samples drawn per round
    #[validate(range(min = 1, message = "batch size must be at least 1"))]
    pub batch: usize,

    /// Number of bootstrap trials
    #[validate(range(min = 1, message = "iteration count must be at least 1"))]
    pub iterations: usize,

    /// R² a subsample must reach against the full population
    #[validate(range(exclusive_min = 0.0, max = 1.0, message = "threshold must be in (0, 1]"))]
    pub diversity_captured: f64,

    /// Master seed; None draws one from the OS
    pub seed: Option<u64>,

    /// Worker threads; None uses every core
    #[validate(range(min = 1, message = "thread count must be at least 1"))]
    pub threads: Option<usize>,

    /// Give up if the trials take longer than this
    #[validate(range(min = 1, message = "timeout must be at least 1 second"))]
    pub timeout_secs: Option<u64>,
}

impl SamplingConfig {
    /// Config with default batch, iteration count and threshold
    pub fn new(vcf_path: impl Into<PathBuf>) -> Self {
        Self {
            vcf_path: vcf_path.into(),
            sample_file: None,
            batch: DEFAULT_BATCH,
            iterations: DEFAULT_ITERATIONS,
            diversity_captured: DEFAULT_THRESHOLD,
            seed: None,
            threads: None,
            timeout_secs: None,
        }
    }

    /// Validate every field, reporting all failures in one Parameter error
    pub fn check(&self) -> Result<(), CaptureError> {
        if self.diversity_captured.is_nan() {
            return Err(CaptureError::Parameter(
                "diversity_captured: threshold must be in (0, 1]".to_string(),
            ));
        }

        self.validate()
            .map_err(|errors| CaptureError::Parameter(errors.to_string()))
    }
}

fn validate_vcf_path(path: &PathBuf) -> Result<(), ValidationError> {
    if has_vcf_extension(path) {
        return Ok(());
    }

    let mut err = ValidationError::new("vcf_extension");
    err.message = Some(Cow::from(format!(
        "{} is not a .vcf, .vcf.gz or .vcf.bgz file",
        path.display()
    )));
    Err(err)
}

fn has_vcf_extension(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    VCF_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}
