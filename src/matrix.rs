// ==============================================================================
// matrix.rs - Genotype Matrix and Allele Frequency Engine
// ==============================================================================
// Description: Variant × sample genotype storage with per-subset allele frequencies
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
// Allele frequency at a site, over a set of sample columns:
//   AF = Σ alt alleles / Σ called alleles
// A site with no called alleles in the set has no frequency (None). The same
// rule is used for the reference vector and every trial vector, and the
// regression only pairs sites defined in both.
// ==============================================================================

use std::collections::{HashMap, HashSet};

use crate::error::{CaptureError, Result};
use crate::genotype_converter::GenotypeCall;
use crate::models::VariantSite;

/// Allele frequencies, one entry per variant row
#[derive(Debug, Clone, PartialEq)]
pub struct AlleleFrequencies(Vec<Option<f64>>);

impl AlleleFrequencies {
    pub fn new(values: Vec<Option<f64>>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<f64> {
        self.0.get(row).copied().flatten()
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.0
    }

    /// Number of rows with a defined frequency
    pub fn defined_count(&self) -> usize {
        self.0.iter().filter(|v| v.is_some()).count()
    }
}

/// Genotype matrix: variant rows × sample columns
///
/// Columns are stored sample-major so a subset of samples can be summed
/// without touching the others. Built once per run and shared read-only.
#[derive(Debug, Clone)]
pub struct GenotypeMatrix {
    sites: Vec<VariantSite>,
    sample_names: Vec<String>,
    columns: Vec<Vec<GenotypeCall>>,
    name_index: HashMap<String, usize>,
}

impl GenotypeMatrix {
    /// Build a matrix, checking that every column has one call per site and
    /// that sample names are unique
    pub fn new(
        sites: Vec<VariantSite>,
        sample_names: Vec<String>,
        columns: Vec<Vec<GenotypeCall>>,
    ) -> Result<Self> {
        if sample_names.len() != columns.len() {
            return Err(CaptureError::Input(format!(
                "{} sample names for {} genotype columns",
                sample_names.len(),
                columns.len()
            )));
        }

        for (name, column) in sample_names.iter().zip(&columns) {
            if column.len() != sites.len() {
                return Err(CaptureError::Input(format!(
                    "Sample '{}' has {} genotype calls, expected {}",
                    name,
                    column.len(),
                    sites.len()
                )));
            }
        }

        let mut name_index = HashMap::with_capacity(sample_names.len());
        for (idx, name) in sample_names.iter().enumerate() {
            if name_index.insert(name.clone(), idx).is_some() {
                return Err(CaptureError::Input(format!("Duplicate sample name '{}'", name)));
            }
        }

        Ok(Self {
            sites,
            sample_names,
            columns,
            name_index,
        })
    }

    pub fn variant_count(&self) -> usize {
        self.sites.len()
    }

    pub fn sample_count(&self) -> usize {
        self.columns.len()
    }

    pub fn sites(&self) -> &[VariantSite] {
        &self.sites
    }

    pub fn sample_names(&self) -> &[String] {
        &self.sample_names
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.name_index.get(name).copied()
    }

    /// Allele frequencies over every sample column
    pub fn reference_frequencies(&self) -> Result<AlleleFrequencies> {
        let all: Vec<usize> = (0..self.sample_count()).collect();
        self.allele_frequencies(&all)
    }

    /// Allele frequencies over the named sample columns
    pub fn allele_frequencies_by_name<S: AsRef<str>>(&self, names: &[S]) -> Result<AlleleFrequencies> {
        let indices = self.resolve_names(names)?;
        self.allele_frequencies(&indices)
    }

    /// Allele frequencies over the given column indices
    ///
    /// # Returns
    /// * `Ok(AlleleFrequencies)` - One entry per variant row, None where no
    ///   allele was called in the subset
    /// * `Err(CaptureError::Input)` - Empty subset or index out of range
    pub fn allele_frequencies(&self, columns: &[usize]) -> Result<AlleleFrequencies> {
        if columns.is_empty() {
            return Err(CaptureError::Input(
                "Cannot compute allele frequencies over an empty sample set".to_string(),
            ));
        }

        let mut alt = vec![0u64; self.variant_count()];
        let mut called = vec![0u64; self.variant_count()];

        for &col in columns {
            let column = self.columns.get(col).ok_or_else(|| {
                CaptureError::Input(format!(
                    "Sample column {} out of range ({} samples)",
                    col,
                    self.sample_count()
                ))
            })?;

            for (row, call) in column.iter().enumerate() {
                alt[row] += u64::from(call.alt);
                called[row] += u64::from(call.called);
            }
        }

        let values = alt
            .into_iter()
            .zip(called)
            .map(|(a, c)| if c == 0 { None } else { Some(a as f64 / c as f64) })
            .collect();

        Ok(AlleleFrequencies(values))
    }

    fn resolve_names<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<usize>> {
        let mut seen = HashSet::with_capacity(names.len());
        let mut indices = Vec::with_capacity(names.len());

        for name in names {
            let name = name.as_ref();
            let idx = self
                .column_index(name)
                .ok_or_else(|| CaptureError::Input(format!("Sample '{}' not found in genotype matrix", name)))?;
            if seen.insert(idx) {
                indices.push(idx);
            }
        }

        Ok(indices)
    }
}
