// ==============================================================================
// sample_list.rs - Sample Name List Parser
// ==============================================================================
// Description: Parser for sub-population sample lists (one name per line)
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
// Format: Plain text, one sample identifier per line
// Example:
//   tree_014
//   tree_022
//
//   tree_031
// Blank lines are discarded and surrounding whitespace is trimmed.
// ==============================================================================

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Errors that can occur while reading a sample list
#[derive(Error, Debug)]
pub enum SampleListError {
    #[error("Failed to read sample list {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Sample list {0} contains no sample names")]
    Empty(String),
}

/// Read an ordered, duplicate-free list of sample names
///
/// # Returns
/// * `Ok(Vec<String>)` - Names in file order; later duplicates are dropped
/// * `Err(SampleListError)` - Unreadable file or no names after removing blanks
pub fn read_sample_list(path: impl AsRef<Path>) -> Result<Vec<String>, SampleListError> {
    let path = path.as_ref();
    let io_err = |source| SampleListError::Io {
        path: path.display().to_string(),
        source,
    };

    let reader = BufReader::new(File::open(path).map_err(io_err)?);

    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for (line_number, line) in reader.lines().enumerate() {
        let line = line.map_err(io_err)?;
        let name = line.trim();

        if name.is_empty() {
            continue;
        }

        if seen.insert(name.to_string()) {
            names.push(name.to_string());
        } else {
            warn!(
                "Duplicate sample '{}' at line {} of {}, ignoring",
                name,
                line_number + 1,
                path.display()
            );
        }
    }

    if names.is_empty() {
        return Err(SampleListError::Empty(path.display().to_string()));
    }

    Ok(names)
}
