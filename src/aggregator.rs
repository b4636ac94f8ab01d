// ==============================================================================
// aggregator.rs - Bootstrap Trial Aggregation
// ==============================================================================
// Description: Runs many independent trials and reduces them to a sample-size
//              estimate with a confidence interval
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
// Statistics over the per-trial sample sizes (rounds × batch), N trials:
//   mean    = Σx / N
//   std_dev = √(Σ(x - mean)² / N)          population SD, all trials observed
//   SEM     = √(Σ(x - mean)² / (N - 1)) / √N
//   95% CI  = mean ± t(0.975, N - 1) · SEM
// Trials run in parallel. Each gets its own RNG seeded from a seed list drawn
// up front, so a fixed master seed reproduces the run on any thread count.
// ==============================================================================

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::{debug, info};

use crate::bootstrap::BootstrapTrial;
use crate::error::{CaptureError, Result};
use crate::models::{SummaryStatistics, TrialOutcome};

/// Confidence level of the reported interval
pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// Runs `iterations` independent bootstrap trials
pub struct TrialAggregator<'a> {
    trial: BootstrapTrial<'a>,
    iterations: usize,
    seed: Option<u64>,
    threads: Option<usize>,
}

impl<'a> TrialAggregator<'a> {
    pub fn new(trial: BootstrapTrial<'a>, iterations: usize) -> Result<Self> {
        if iterations == 0 {
            return Err(CaptureError::Parameter(
                "iteration count must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            trial,
            iterations,
            seed: None,
            threads: None,
        })
    }

    /// Seed the run for reproducible results
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Limit the worker pool size (defaults to rayon's global pool)
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    /// Run every trial and return the outcomes in seed order
    pub fn run_trials(&self) -> Result<Vec<TrialOutcome>> {
        let mut master = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let seeds: Vec<u64> = (0..self.iterations).map(|_| master.gen()).collect();

        info!(
            "Running {} bootstrap trials (batch {}, R² threshold {})",
            self.iterations,
            self.trial.batch(),
            self.trial.r2_threshold()
        );

        let run_all = || {
            seeds
                .par_iter()
                .enumerate()
                .map(|(idx, &seed)| -> Result<TrialOutcome> {
                    let mut rng = StdRng::seed_from_u64(seed);
                    let outcome = self.trial.run(&mut rng)?;
                    debug!(
                        "Trial {} finished after {} rounds ({} samples, R² = {:.4})",
                        idx + 1,
                        outcome.rounds,
                        outcome.samples_drawn,
                        outcome.r_squared
                    );
                    Ok(outcome)
                })
                .collect::<Result<Vec<_>>>()
        };

        match self.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| CaptureError::Parameter(format!("failed to build thread pool: {}", e)))?;
                pool.install(run_all)
            }
            None => run_all(),
        }
    }

    /// Run every trial and summarize the estimated sample sizes
    pub fn run(&self) -> Result<SummaryStatistics> {
        let outcomes = self.run_trials()?;
        let batch = self.trial.batch();
        let sample_sizes: Vec<usize> = outcomes.iter().map(|o| o.rounds * batch).collect();

        let stats = summarize(&sample_sizes, batch, self.trial.r2_threshold())?;
        info!(
            "Estimated sample size {:.2} (SD {:.2}, 95% CI {:.2}-{:.2}) over {} trials",
            stats.mean, stats.std_dev, stats.ci_lower, stats.ci_upper, stats.iterations
        );
        Ok(stats)
    }
}

/// Reduce per-trial sample sizes to summary statistics
pub fn summarize(sample_sizes: &[usize], batch: usize, r2_threshold: f64) -> Result<SummaryStatistics> {
    let values: Vec<f64> = sample_sizes.iter().map(|&s| s as f64).collect();

    let (ci_lower, ci_upper) = confidence_interval(&values, CONFIDENCE_LEVEL)?;
    let mean = mean(&values);
    let std_dev = population_std_dev(&values);

    if !mean.is_finite() || !std_dev.is_finite() {
        return Err(CaptureError::Computation(format!(
            "non-finite summary (mean = {}, std_dev = {})",
            mean, std_dev
        )));
    }

    Ok(SummaryStatistics {
        mean,
        std_dev,
        ci_lower,
        ci_upper,
        iterations: sample_sizes.len(),
        min: sample_sizes.iter().copied().min().unwrap_or(0),
        max: sample_sizes.iter().copied().max().unwrap_or(0),
        batch,
        r2_threshold,
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sum_sq_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum()
}

/// Standard deviation dividing by N
pub fn population_std_dev(values: &[f64]) -> f64 {
    (sum_sq_dev(values) / values.len() as f64).sqrt()
}

/// Two-sided Student t confidence interval for the mean
///
/// # Returns
/// * `Ok((lower, upper))` - Interval bounds; collapses to the mean when every
///   value is equal
/// * `Err(CaptureError::Statistics)` - Fewer than two values
pub fn confidence_interval(values: &[f64], level: f64) -> Result<(f64, f64)> {
    let n = values.len();
    if n < 2 {
        return Err(CaptureError::Statistics(format!(
            "a confidence interval needs at least 2 trials, got {}",
            n
        )));
    }
    if !(level > 0.0 && level < 1.0) {
        return Err(CaptureError::Statistics(format!(
            "confidence level {} is outside (0, 1)",
            level
        )));
    }

    let m = mean(values);
    let df = (n - 1) as f64;
    let sem = (sum_sq_dev(values) / df).sqrt() / (n as f64).sqrt();

    if sem == 0.0 {
        return Ok((m, m));
    }

    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| CaptureError::Statistics(format!("invalid t distribution: {}", e)))?;
    let t = dist.inverse_cdf(0.5 + level / 2.0);

    let half_width = t * sem;
    if !half_width.is_finite() {
        return Err(CaptureError::Statistics(format!(
            "undefined t quantile for {} degrees of freedom",
            df
        )));
    }

    Ok((m - half_width, m + half_width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::tests::{random_matrix, random_matrix_with_missing};
    use std::sync::atomic::AtomicBool;

    #[test]
    fn test_single_trial_has_no_interval() {
        assert!(matches!(
            confidence_interval(&[10.0], CONFIDENCE_LEVEL),
            Err(CaptureError::Statistics(_))
        ));
        assert!(matches!(summarize(&[10], 5, 0.9), Err(CaptureError::Statistics(_))));
    }

    #[test]
    fn test_known_statistics() {
        let stats = summarize(&[5, 10, 10, 15, 20], 5, 0.9).unwrap();
        assert!((stats.mean - 12.0).abs() < 1e-12);
        // population SD = sqrt(130 / 5)
        assert!((stats.std_dev - 26f64.sqrt()).abs() < 1e-12);
        // SEM = sqrt(130 / 4) / sqrt(5), t(0.975, 4) = 2.7764
        assert!((stats.ci_lower - 4.9214).abs() < 1e-2, "lower {}", stats.ci_lower);
        assert!((stats.ci_upper - 19.0786).abs() < 1e-2, "upper {}", stats.ci_upper);
        assert_eq!(stats.min, 5);
        assert_eq!(stats.max, 20);
        assert_eq!(stats.iterations, 5);
    }

    #[test]
    fn test_identical_trials_collapse_interval() {
        let (lower, upper) = confidence_interval(&[10.0, 10.0, 10.0], CONFIDENCE_LEVEL).unwrap();
        assert_eq!(lower, 10.0);
        assert_eq!(upper, 10.0);
    }

    #[test]
    fn test_interval_brackets_mean() {
        let values = [3.0, 9.0, 6.0, 12.0, 6.0, 3.0];
        let (lower, upper) = confidence_interval(&values, CONFIDENCE_LEVEL).unwrap();
        let m = mean(&values);
        assert!(lower <= m && m <= upper);
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let matrix = random_matrix(2, 10, 10);
        let reference = matrix.reference_frequencies().unwrap();
        let trial = BootstrapTrial::new(&matrix, &reference, 2, 0.9).unwrap();
        assert!(matches!(
            TrialAggregator::new(trial, 0),
            Err(CaptureError::Parameter(_))
        ));
    }

    #[test]
    fn test_end_to_end_scenario() {
        // 10 variants, 20 samples, batch 5, 50 iterations, threshold 0.95
        let matrix = random_matrix(2024, 20, 10);
        let reference = matrix.reference_frequencies().unwrap();
        let trial = BootstrapTrial::new(&matrix, &reference, 5, 0.95).unwrap();
        let stats = TrialAggregator::new(trial, 50)
            .unwrap()
            .with_seed(Some(42))
            .run()
            .unwrap();

        assert_eq!(stats.iterations, 50);
        assert!(stats.mean >= 5.0 && stats.mean <= 20.0, "mean {}", stats.mean);
        assert!(stats.std_dev >= 0.0);
        assert!(stats.ci_lower.is_finite() && stats.ci_upper.is_finite());
        assert!(stats.ci_lower <= stats.mean && stats.mean <= stats.ci_upper);
        assert_eq!(stats.min % 5, 0);
    }

    #[test]
    fn test_end_to_end_with_missing_calls() {
        // 10% of calls are "./.", so trial profiles pair with fewer sites
        let matrix = random_matrix_with_missing(2025, 20, 10, 0.1);
        let reference = matrix.reference_frequencies().unwrap();
        let trial = BootstrapTrial::new(&matrix, &reference, 5, 0.95).unwrap();
        let stats = TrialAggregator::new(trial, 50)
            .unwrap()
            .with_seed(Some(42))
            .run()
            .unwrap();

        assert_eq!(stats.iterations, 50);
        assert!(stats.mean >= 5.0 && stats.mean <= 20.0, "mean {}", stats.mean);
        assert!(stats.std_dev.is_finite());
        assert!(stats.ci_lower <= stats.mean && stats.mean <= stats.ci_upper);
    }

    #[test]
    fn test_cancelled_run_fails_fast() {
        let matrix = random_matrix(12, 40, 50);
        let reference = matrix.reference_frequencies().unwrap();
        let cancel = AtomicBool::new(true);
        let trial = BootstrapTrial::new(&matrix, &reference, 1, 1.0)
            .unwrap()
            .with_cancel(&cancel);
        let result = TrialAggregator::new(trial, 1000).unwrap().with_seed(Some(5)).run();
        assert!(matches!(result, Err(CaptureError::Cancelled { round: 1 })));
    }

    #[test]
    fn test_full_batch_every_trial_one_round() {
        let matrix = random_matrix(8, 12, 20);
        let reference = matrix.reference_frequencies().unwrap();
        let trial = BootstrapTrial::new(&matrix, &reference, 12, 1.0).unwrap();
        let outcomes = TrialAggregator::new(trial, 10)
            .unwrap()
            .with_seed(Some(1))
            .run_trials()
            .unwrap();
        assert!(outcomes.iter().all(|o| o.rounds == 1 && o.r_squared == 1.0));
    }

    #[test]
    fn test_exhaustion_propagates() {
        let matrix = random_matrix(9, 20, 10);
        let reference = matrix.reference_frequencies().unwrap();
        let trial = BootstrapTrial::new(&matrix, &reference, 21, 0.9).unwrap();
        let result = TrialAggregator::new(trial, 100).unwrap().with_seed(Some(3)).run();
        assert!(matches!(result, Err(CaptureError::SamplingExhaustion { .. })));
    }

    #[test]
    fn test_seeded_runs_ignore_thread_count() {
        let matrix = random_matrix(31, 24, 15);
        let reference = matrix.reference_frequencies().unwrap();
        let trial = BootstrapTrial::new(&matrix, &reference, 3, 0.9).unwrap();

        let single = TrialAggregator::new(trial, 20)
            .unwrap()
            .with_seed(Some(7))
            .with_threads(Some(1))
            .run_trials()
            .unwrap();
        let multi = TrialAggregator::new(trial, 20)
            .unwrap()
            .with_seed(Some(7))
            .with_threads(Some(4))
            .run_trials()
            .unwrap();
        assert_eq!(single, multi);
    }
}
