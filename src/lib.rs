// ==============================================================================
// lib.rs - Diversity Capture Library
// ==============================================================================
// Description: Library interface for bootstrap sampling-size estimation
// Author: Matt Barham
// Created: 2025-11-03
// Modified: 2026-10-18
// Version: 2.0.0
// ==============================================================================

pub mod parsers;
pub mod error;
pub mod config;
pub mod genotype_converter;
pub mod models;
pub mod matrix;
pub mod regression;
pub mod bootstrap;
pub mod aggregator;
pub mod processor;
pub mod output;

pub use error::CaptureError;
