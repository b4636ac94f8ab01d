// ==============================================================================
// parsers/mod.rs - File parser modules
// ==============================================================================
// Description: Loaders for genotype matrices and sample name lists
// Author: Matt Barham
// Created: 2025-11-03
// Modified: 2026-10-18
// Version: 2.0.0
// ==============================================================================

pub mod vcf;
pub mod sample_list;

pub use vcf::{VcfLoader, VcfLoadError};
pub use sample_list::{read_sample_list, SampleListError};
