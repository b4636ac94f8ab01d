// ==============================================================================
// genotype_converter.rs - Genotype to Allele Count Conversion
// ==============================================================================
// Description: Converts VCF GT values to alternate / called allele counts
// Author: Matt Barham
// Created: 2025-11-06
// Modified: 2026-10-18
// Version: 2.0.0
// ==============================================================================
// Algorithm:
//   Split the GT value on '/' or '|' (phasing is ignored) and inspect each
//   allele index:
//   - "0"            → called reference allele
//   - "1", "2", ...  → called alternate allele (any ALT counts)
//   - "."            → missing, not counted
//   Examples: "0/0" → 0 of 2, "0|1" → 1 of 2, "1/1" → 2 of 2, "./." → 0 of 0,
//   "1" (haploid) → 1 of 1, "1/2" → 2 of 2
// ==============================================================================

use thiserror::Error;

/// Errors that can occur during genotype conversion
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenotypeParseError {
    #[error("Empty genotype value")]
    Empty,

    #[error("Invalid allele '{allele}' in genotype '{genotype}'")]
    InvalidAllele { genotype: String, allele: String },

    #[error("Genotype '{0}' has more than 255 alleles")]
    TooManyAlleles(String),
}

/// Allele counts for one sample at one variant site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenotypeCall {
    /// Number of called alleles that are not the reference allele
    pub alt: u8,
    /// Number of called (non-missing) alleles
    pub called: u8,
}

impl GenotypeCall {
    pub const MISSING: GenotypeCall = GenotypeCall { alt: 0, called: 0 };

    pub fn new(alt: u8, called: u8) -> Self {
        debug_assert!(alt <= called);
        Self { alt, called }
    }

    pub fn is_missing(&self) -> bool {
        self.called == 0
    }
}

/// Diploid fixtures
#[cfg(test)]
impl GenotypeCall {
    pub(crate) fn hom_ref() -> Self {
        Self::new(0, 2)
    }

    pub(crate) fn het() -> Self {
        Self::new(1, 2)
    }

    pub(crate) fn hom_alt() -> Self {
        Self::new(2, 2)
    }
}

/// Convert a VCF GT value to allele counts
///
/// # Arguments
/// * `genotype` - GT value (e.g., "0/1", "1|1", "./.", "0")
///
/// # Returns
/// * `Ok(GenotypeCall)` - Alternate and called allele counts
/// * `Err(GenotypeParseError)` - Empty value or non-numeric allele index
///
/// # Examples
/// ```
/// use diversity_capture::genotype_converter::{parse_gt, GenotypeCall};
///
/// assert_eq!(parse_gt("0/0").unwrap(), GenotypeCall::new(0, 2));
/// assert_eq!(parse_gt("0|1").unwrap(), GenotypeCall::new(1, 2));
/// assert_eq!(parse_gt("./.").unwrap(), GenotypeCall::MISSING);
/// ```
pub fn parse_gt(genotype: &str) -> Result<GenotypeCall, GenotypeParseError> {
    let genotype = genotype.trim();
    if genotype.is_empty() {
        return Err(GenotypeParseError::Empty);
    }

    let mut alt: usize = 0;
    let mut called: usize = 0;

    for allele in genotype.split(['/', '|']) {
        match allele {
            "." => continue,
            "0" => called += 1,
            other => {
                other.parse::<u32>().map_err(|_| GenotypeParseError::InvalidAllele {
                    genotype: genotype.to_string(),
                    allele: other.to_string(),
                })?;
                called += 1;
                alt += 1;
            }
        }
    }

    let called = u8::try_from(called)
        .map_err(|_| GenotypeParseError::TooManyAlleles(genotype.to_string()))?;
    // alt <= called, so this cannot fail once `called` fits
    let alt = alt as u8;

    Ok(GenotypeCall { alt, called })
}

/// Extract the GT value from a colon-separated sample field
///
/// `gt_index` is the position of `GT` among the FORMAT keys. A sample field
/// that is shorter than the FORMAT (trailing fields dropped) is treated as
/// missing, as is a bare ".".
pub fn parse_sample_field(field: &str, gt_index: usize) -> Result<GenotypeCall, GenotypeParseError> {
    match field.split(':').nth(gt_index) {
        Some(value) => parse_gt(value),
        None => Ok(GenotypeCall::MISSING),
    }
}
