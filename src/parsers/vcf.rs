// ==============================================================================
// parsers/vcf.rs - VCF genotype matrix loader
// ==============================================================================
// Description: Loads a VCF (plain or bgzipped) into a GenotypeMatrix using noodles-vcf
// Author: Matt Barham
// Created: 2025-11-03
// Modified: 2026-10-18
// Version: 2.0.0
// ==============================================================================
// References:
// - VCF 4.3 Spec: https://samtools.github.io/hts-specs/VCFv4.3.pdf
// - noodles-vcf: https://docs.rs/noodles-vcf/0.81.0/noodles_vcf/
// ==============================================================================

use noodles_vcf as vcf;
use noodles_vcf::variant::record::{AlternateBases, Ids};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::error::CaptureError;
use crate::genotype_converter::{parse_sample_field, GenotypeCall, GenotypeParseError};
use crate::matrix::GenotypeMatrix;
use crate::models::VariantSite;

/// VCF loading errors
#[derive(Error, Debug)]
pub enum VcfLoadError {
    #[error("Failed to open VCF file: {0}")]
    FileOpenError(String),

    #[error("Failed to read VCF header: {0}")]
    HeaderError(String),

    #[error("Failed to parse VCF record {record}: {details}")]
    RecordError { record: usize, details: String },

    #[error("Missing required field {field} in VCF record {record}")]
    MissingField { record: usize, field: String },

    #[error("Invalid genotype for sample '{sample}' in VCF record {record}: {source}")]
    Genotype {
        record: usize,
        sample: String,
        #[source]
        source: GenotypeParseError,
    },

    #[error("Sample '{0}' not found in VCF header")]
    SampleNotFound(String),

    #[error("VCF file has no sample columns")]
    NoSamples,

    #[error("VCF file has no variant records")]
    NoVariants,

    #[error("Invalid genotype matrix: {0}")]
    Matrix(String),
}

/// Loads genotype matrices from VCF files
///
/// Only the `GT` FORMAT field is read; other per-sample fields are ignored.
#[derive(Debug, Clone, Default)]
pub struct VcfLoader {
    /// Samples to keep, in output column order. None keeps every sample.
    pub samples: Option<Vec<String>>,
}

impl VcfLoader {
    /// Create a loader that keeps every sample
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the matrix to these samples (in this order)
    pub fn with_samples(mut self, samples: Option<Vec<String>>) -> Self {
        self.samples = samples;
        self
    }

    /// Load a VCF file into a genotype matrix
    ///
    /// # Arguments
    /// * `path` - Path to VCF file (can be .vcf or .vcf.gz)
    ///
    /// # Returns
    /// * `Result<GenotypeMatrix, VcfLoadError>` - Matrix or the first error found
    ///
    /// # Example
    /// ```no_run
    /// use diversity_capture::parsers::VcfLoader;
    ///
    /// let matrix = VcfLoader::new()
    ///     .with_samples(Some(vec!["tree_014".to_string(), "tree_022".to_string()]))
    ///     .load("adaptive_snps.vcf.gz")?;
    /// println!("{} variants × {} samples", matrix.variant_count(), matrix.sample_count());
    /// # Ok::<(), diversity_capture::parsers::VcfLoadError>(())
    /// ```
    pub fn load(&self, path: impl AsRef<Path>) -> Result<GenotypeMatrix, VcfLoadError> {
        let path = path.as_ref();

        let mut reader = vcf::io::reader::Builder::default()
            .build_from_path(path)
            .map_err(|e| VcfLoadError::FileOpenError(format!("{}: {}", path.display(), e)))?;

        let header = reader
            .read_header()
            .map_err(|e| VcfLoadError::HeaderError(format!("{}", e)))?;

        let file_samples: Vec<String> = header.sample_names().iter().cloned().collect();
        if file_samples.is_empty() {
            return Err(VcfLoadError::NoSamples);
        }

        let selected = self.select_columns(&file_samples)?;
        debug!(
            "Keeping {} of {} samples from {}",
            selected.len(),
            file_samples.len(),
            path.display()
        );

        let mut sites = Vec::new();
        let mut columns: Vec<Vec<GenotypeCall>> = vec![Vec::new(); selected.len()];
        let mut missing_calls = 0usize;

        for (idx, result) in reader.records().enumerate() {
            let record_num = idx + 1;
            let record = result.map_err(|e| VcfLoadError::RecordError {
                record: record_num,
                details: e.to_string(),
            })?;

            let samples = record.samples();
            let raw_samples: &str = samples.as_ref();
            let (format, calls) = parse_samples(raw_samples, &file_samples, record_num)?;

            for (column, &file_idx) in columns.iter_mut().zip(&selected) {
                let call = calls[file_idx];
                if call.is_missing() {
                    missing_calls += 1;
                }
                column.push(call);
            }

            sites.push(parse_site(&record, format, record_num)?);
        }

        if sites.is_empty() {
            return Err(VcfLoadError::NoVariants);
        }

        let sample_names = selected.iter().map(|&i| file_samples[i].clone()).collect();
        let matrix = GenotypeMatrix::new(sites, sample_names, columns).map_err(|e| match e {
            CaptureError::Input(msg) => VcfLoadError::Matrix(msg),
            other => VcfLoadError::Matrix(other.to_string()),
        })?;

        info!(
            "Loaded {} variants × {} samples from {}",
            matrix.variant_count(),
            matrix.sample_count(),
            path.display()
        );
        if missing_calls > 0 {
            info!(
                "{} of {} genotype calls are missing",
                missing_calls,
                matrix.variant_count() * matrix.sample_count()
            );
        }

        Ok(matrix)
    }

    /// Map requested sample names to header column indices
    fn select_columns(&self, file_samples: &[String]) -> Result<Vec<usize>, VcfLoadError> {
        match &self.samples {
            None => Ok((0..file_samples.len()).collect()),
            Some(names) => names
                .iter()
                .map(|name| {
                    file_samples
                        .iter()
                        .position(|s| s == name)
                        .ok_or_else(|| VcfLoadError::SampleNotFound(name.clone()))
                })
                .collect(),
        }
    }
}

/// Split the FORMAT + sample columns and parse every sample's GT
///
/// The raw string is the tab-separated tail of the record starting at FORMAT,
/// e.g. "GT:DS\t0|0:0.01\t0|1:0.98".
fn parse_samples<'r>(
    raw: &'r str,
    sample_names: &[String],
    record_num: usize,
) -> Result<(&'r str, Vec<GenotypeCall>), VcfLoadError> {
    let mut fields = raw.split('\t');

    let format = fields
        .next()
        .filter(|f| !f.is_empty())
        .ok_or_else(|| VcfLoadError::MissingField {
            record: record_num,
            field: "FORMAT".to_string(),
        })?;

    let gt_index = format
        .split(':')
        .position(|k| k == "GT")
        .ok_or_else(|| VcfLoadError::MissingField {
            record: record_num,
            field: "GT".to_string(),
        })?;

    let values: Vec<&str> = fields.collect();
    if values.len() != sample_names.len() {
        return Err(VcfLoadError::RecordError {
            record: record_num,
            details: format!(
                "expected {} sample columns, found {}",
                sample_names.len(),
                values.len()
            ),
        });
    }

    let calls = values
        .iter()
        .zip(sample_names)
        .map(|(value, sample)| {
            parse_sample_field(value, gt_index).map_err(|source| VcfLoadError::Genotype {
                record: record_num,
                sample: sample.clone(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok((format, calls))
}

/// Extract the fixed columns of a record
fn parse_site(record: &vcf::Record, format: &str, record_num: usize) -> Result<VariantSite, VcfLoadError> {
    let record_err = |details: String| VcfLoadError::RecordError {
        record: record_num,
        details,
    };

    let chromosome = record.reference_sequence_name().to_string();

    let position = match record.variant_start() {
        Some(Ok(pos)) => pos.get() as u64,
        Some(Err(e)) => return Err(record_err(format!("Failed to get position: {}", e))),
        None => {
            return Err(VcfLoadError::MissingField {
                record: record_num,
                field: "POS".to_string(),
            })
        }
    };

    let ids = record.ids();
    let id = if ids.is_empty() {
        None
    } else {
        ids.iter().next().map(|id| id.to_string())
    };

    let ref_allele = record.reference_bases().to_string();

    let alt_alleles = record
        .alternate_bases()
        .iter()
        .map(|alt| alt.map(|a| a.to_string()))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| record_err(format!("Failed to get ALT allele: {}", e)))?;

    let quality = record
        .quality_score()
        .transpose()
        .map_err(|e| record_err(format!("Failed to get QUAL: {}", e)))?;

    let filters = record.filters();
    let info = record.info();

    Ok(VariantSite {
        chromosome,
        position,
        id,
        ref_allele,
        alt_alleles,
        quality,
        filter: or_missing(filters.as_ref()),
        info: or_missing(info.as_ref()),
        format: format.to_string(),
    })
}

fn or_missing(raw: &str) -> String {
    if raw.is_empty() {
        ".".to_string()
    } else {
        raw.to_string()
    }
}
