// ==============================================================================
// regression.rs - Ordinary Least Squares Regression
// ==============================================================================
// Description: Simple linear regression between two allele-frequency profiles
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
// Algorithm (n paired observations, x = predictor, y = response):
//   sxx = Σ(x - x̄)²   syy = Σ(y - ȳ)²   sxy = Σ(x - x̄)(y - ȳ)
//   slope = sxy / sxx, intercept = ȳ - slope·x̄
//   R² = sxy² / (sxx·syy), r = sign(sxy)·√R²
//   t = r·√(df / (1 - R²)), df = n - 2, p = 2·P(T > |t|)
//   stderr(slope) = √((1 - R²)·syy / sxx / df)
// R² is the squared Pearson correlation: any exact linear relation gives 1.
// ==============================================================================

use statrs::distribution::{ContinuousCDF, StudentsT};
use thiserror::Error;

use crate::matrix::AlleleFrequencies;

/// Errors that make a regression undefined
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegressionError {
    #[error("Vectors differ in length ({0} vs {1})")]
    LengthMismatch(usize, usize),

    #[error("Need at least 2 paired observations, found {0}")]
    TooFewPoints(usize),

    #[error("Predictor has zero variance across {0} observations")]
    ConstantPredictor(usize),

    #[error("Response has zero variance across {0} observations")]
    ConstantResponse(usize),
}

/// Fitted line and goodness of fit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Regression {
    pub n: usize,
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation coefficient
    pub r: f64,
    pub r_squared: f64,
    /// Two-sided p-value for slope = 0, None when n = 2
    pub p_value: Option<f64>,
    /// Standard error of the slope, None when n = 2
    pub std_err: Option<f64>,
}

/// Regress `y` on `x`
pub fn linregress(x: &[f64], y: &[f64]) -> Result<Regression, RegressionError> {
    if x.len() != y.len() {
        return Err(RegressionError::LengthMismatch(x.len(), y.len()));
    }
    let n = x.len();
    if n < 2 {
        return Err(RegressionError::TooFewPoints(n));
    }

    let nf = n as f64;
    let x_mean = x.iter().sum::<f64>() / nf;
    let y_mean = y.iter().sum::<f64>() / nf;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if syy == 0.0 {
        return Err(RegressionError::ConstantResponse(n));
    }
    if sxx == 0.0 {
        return Err(RegressionError::ConstantPredictor(n));
    }

    let r_squared = ((sxy * sxy) / (sxx * syy)).min(1.0);
    let r = r_squared.sqrt().copysign(sxy);
    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let (p_value, std_err) = if n > 2 {
        let df = (n - 2) as f64;
        let std_err = ((1.0 - r_squared) * syy / sxx / df).sqrt();
        (two_sided_p(r_squared, r, df), Some(std_err))
    } else {
        (None, None)
    };

    Ok(Regression {
        n,
        slope,
        intercept,
        r,
        r_squared,
        p_value,
        std_err,
    })
}

/// Regress the reference profile on a subset profile, pairing rows that are
/// defined in both
pub fn regress_frequencies(
    subset: &AlleleFrequencies,
    reference: &AlleleFrequencies,
) -> Result<Regression, RegressionError> {
    if subset.len() != reference.len() {
        return Err(RegressionError::LengthMismatch(subset.len(), reference.len()));
    }

    let (x, y): (Vec<f64>, Vec<f64>) = subset
        .values()
        .iter()
        .zip(reference.values())
        .filter_map(|(s, r)| Some(((*s)?, (*r)?)))
        .unzip();

    linregress(&x, &y)
}

fn two_sided_p(r_squared: f64, r: f64, df: f64) -> Option<f64> {
    if r_squared >= 1.0 {
        return Some(0.0);
    }
    let t = r * (df / (1.0 - r_squared)).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some((2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0))
}
