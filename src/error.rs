// ==============================================================================
// error.rs - Diversity Capture Errors
// ==============================================================================
// Description: Error kinds that abort a sampling-size estimation run
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

use thiserror::Error;

use crate::genotype_converter::GenotypeParseError;
use crate::parsers::{SampleListError, VcfLoadError};

/// Errors that can occur while estimating a sample size
///
/// Every variant is fatal for the current run; no partial report is produced.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// Malformed genotype file, missing sample, empty sample list
    #[error("Input error: {0}")]
    Input(String),

    /// Invalid batch size, iteration count or threshold
    #[error("Invalid parameter: {0}")]
    Parameter(String),

    /// A batch draw asked for more samples than were left undrawn
    #[error(
        "Sampling pool exhausted in round {round}: requested {requested} samples but only {remaining} remain undrawn"
    )]
    SamplingExhaustion {
        round: usize,
        requested: usize,
        remaining: usize,
    },

    #[error("Statistics error: {0}")]
    Statistics(String),

    /// Regression or allele-frequency computation produced an undefined value
    #[error("Computation error: {0}")]
    Computation(String),

    #[error("Sampling did not finish within {0} seconds")]
    Timeout(u64),

    /// The run was stopped from outside, e.g. after a timeout
    #[error("Sampling cancelled in round {round}")]
    Cancelled { round: usize },
}

impl From<VcfLoadError> for CaptureError {
    fn from(err: VcfLoadError) -> Self {
        CaptureError::Input(err.to_string())
    }
}

impl From<SampleListError> for CaptureError {
    fn from(err: SampleListError) -> Self {
        CaptureError::Input(err.to_string())
    }
}

impl From<GenotypeParseError> for CaptureError {
    fn from(err: GenotypeParseError) -> Self {
        CaptureError::Input(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CaptureError>;
