// ==============================================================================
// models.rs - Sampling Data Models
// ==============================================================================
// Description: Variant metadata, trial outcomes and run summary structures
// Author: Matt Barham
// Created: 2025-11-12
// Modified: 2026-10-18
// Version: 3.0.0
// ==============================================================================

use serde::{Deserialize, Serialize};

/// Per-variant metadata (the fixed VCF columns)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSite {
    /// Chromosome / contig name as written in the file (e.g., "1", "chr1", "Chr05")
    pub chromosome: String,

    /// 1-based position
    pub position: u64,

    /// Variant ID, None when the file has "."
    pub id: Option<String>,

    /// Reference allele
    pub ref_allele: String,

    /// Alternate alleles (all of them; the frequency collapses them)
    pub alt_alleles: Vec<String>,

    /// QUAL column
    pub quality: Option<f32>,

    /// FILTER column, "." when unset
    pub filter: String,

    /// INFO column, "." when unset
    pub info: String,

    /// FORMAT keys (e.g., "GT:DS")
    pub format: String,
}

impl VariantSite {
    /// Display label: the ID if present, otherwise chrom:pos:ref:alt
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!(
                "{}:{}:{}:{}",
                self.chromosome,
                self.position,
                self.ref_allele,
                self.alt_alleles.join(",")
            ),
        }
    }
}

/// Result of a single bootstrap trial
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialOutcome {
    /// Sampling rounds needed to reach the threshold
    pub rounds: usize,

    /// Samples accumulated when the trial stopped (rounds × batch)
    pub samples_drawn: usize,

    /// R² at the stopping round
    pub r_squared: f64,
}

/// Summary of all trials in a run (the only externally visible output)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    /// Mean estimated sample size
    pub mean: f64,

    /// Population standard deviation (divides by N)
    pub std_dev: f64,

    /// 95% confidence interval for the mean (Student t, N-1 df)
    pub ci_lower: f64,
    pub ci_upper: f64,

    /// Number of trials performed
    pub iterations: usize,

    pub min: usize,
    pub max: usize,

    pub batch: usize,
    pub r2_threshold: f64,
}
