// ==============================================================================
// bootstrap.rs - Incremental Bootstrap Sampling Trial
// ==============================================================================
// Description: Draws sample batches until the subset's allele frequencies
//              explain the reference profile above an R² threshold
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
// One trial:
//   round 0, nothing drawn
//   loop:
//     round += 1
//     draw `batch` columns without replacement from the columns not yet drawn
//     AF over everything drawn so far, regress reference on it
//     stop when R² >= threshold
// The column order is shuffled once per trial and each round takes the next
// `batch` columns, which is a uniform draw without replacement.
// A draw larger than the undrawn pool fails the trial with
// CaptureError::SamplingExhaustion. A raised cancel flag stops the trial at
// the start of its next round. Drawing the whole population gives the
// reference vector itself, so R² = 1 and a threshold in (0, 1] is always met
// once every column is drawn.
// ==============================================================================

use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use crate::error::{CaptureError, Result};
use crate::matrix::{AlleleFrequencies, GenotypeMatrix};
use crate::models::TrialOutcome;
use crate::regression::{regress_frequencies, RegressionError};

/// A single bootstrap trial over a shared, read-only matrix and reference
#[derive(Debug, Clone, Copy)]
pub struct BootstrapTrial<'a> {
    matrix: &'a GenotypeMatrix,
    reference: &'a AlleleFrequencies,
    batch: usize,
    r2_threshold: f64,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> BootstrapTrial<'a> {
    /// Create a trial, checking the parameters and that the reference profile
    /// can be regressed on at all
    pub fn new(
        matrix: &'a GenotypeMatrix,
        reference: &'a AlleleFrequencies,
        batch: usize,
        r2_threshold: f64,
    ) -> Result<Self> {
        if batch == 0 {
            return Err(CaptureError::Parameter("batch size must be at least 1".to_string()));
        }
        if !(r2_threshold > 0.0 && r2_threshold <= 1.0) {
            return Err(CaptureError::Parameter(format!(
                "diversity threshold {} is outside (0, 1]",
                r2_threshold
            )));
        }
        if reference.len() != matrix.variant_count() {
            return Err(CaptureError::Computation(format!(
                "reference has {} allele frequencies but the matrix has {} variants",
                reference.len(),
                matrix.variant_count()
            )));
        }
        check_reference(reference)?;

        Ok(Self {
            matrix,
            reference,
            batch,
            r2_threshold,
            cancel: None,
        })
    }

    /// Stop at the next round once `flag` is set
    pub fn with_cancel(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    pub fn batch(&self) -> usize {
        self.batch
    }

    pub fn r2_threshold(&self) -> f64 {
        self.r2_threshold
    }

    /// Run the trial to completion with the given random source
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<TrialOutcome> {
        let population = self.matrix.sample_count();
        let mut order: Vec<usize> = (0..population).collect();
        order.shuffle(rng);

        let mut drawn = 0;
        let mut round = 0;

        loop {
            round += 1;

            if self.is_cancelled() {
                return Err(CaptureError::Cancelled { round });
            }

            let remaining = population - drawn;
            if self.batch > remaining {
                return Err(CaptureError::SamplingExhaustion {
                    round,
                    requested: self.batch,
                    remaining,
                });
            }
            drawn += self.batch;

            let r_squared = self.evaluate(&order[..drawn])?;
            debug!(
                "Round {}: {} samples drawn, R² = {:.4}",
                round,
                drawn,
                r_squared
            );

            if r_squared >= self.r2_threshold {
                return Ok(TrialOutcome {
                    rounds: round,
                    samples_drawn: drawn,
                    r_squared,
                });
            }
        }
    }

    /// R² of the reference profile regressed on the given columns' profile
    ///
    /// A subset whose profile is constant, or that has fewer than two sites
    /// called, explains nothing and scores 0. The same holds when the subset's
    /// missing calls leave only sites where the reference is constant.
    pub fn evaluate(&self, columns: &[usize]) -> Result<f64> {
        let subset = self.matrix.allele_frequencies(columns)?;

        match regress_frequencies(&subset, self.reference) {
            Ok(fit) => {
                debug!(
                    "Regression over {} sites: slope = {:.4}, intercept = {:.4}, p = {:?}",
                    fit.n, fit.slope, fit.intercept, fit.p_value
                );
                Ok(fit.r_squared)
            }
            Err(
                e @ (RegressionError::ConstantPredictor(_)
                | RegressionError::ConstantResponse(_)
                | RegressionError::TooFewPoints(_)),
            ) => {
                debug!("Subset of {} samples is uninformative: {}", columns.len(), e);
                Ok(0.0)
            }
            Err(e) => Err(CaptureError::Computation(format!(
                "regression against reference failed: {}",
                e
            ))),
        }
    }
}

/// The reference needs two or more defined sites that are not all equal
fn check_reference(reference: &AlleleFrequencies) -> Result<()> {
    let defined: Vec<f64> = reference.values().iter().flatten().copied().collect();

    if defined.len() < 2 {
        return Err(CaptureError::Computation(format!(
            "reference allele frequencies are defined at {} sites, need at least 2",
            defined.len()
        )));
    }

    let first = defined[0];
    if defined.iter().all(|&v| v == first) {
        return Err(CaptureError::Computation(format!(
            "reference allele frequency is {} at every site; there is no diversity to capture",
            first
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genotype_converter::GenotypeCall;
    use crate::matrix::tests::{
        matrix_from_calls, matrix_from_dosages, random_matrix, random_matrix_with_missing,
    };
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_full_population_batch_finishes_in_one_round() {
        let matrix = random_matrix(7, 20, 40);
        let reference = matrix.reference_frequencies().unwrap();
        let trial = BootstrapTrial::new(&matrix, &reference, 20, 1.0).unwrap();

        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let outcome = trial.run(&mut rng).unwrap();
            assert_eq!(outcome.rounds, 1);
            assert_eq!(outcome.samples_drawn, 20);
            assert_eq!(outcome.r_squared, 1.0);
        }
    }

    #[test]
    fn test_batch_larger_than_population_is_exhaustion() {
        let matrix = random_matrix(3, 20, 10);
        let reference = matrix.reference_frequencies().unwrap();
        let trial = BootstrapTrial::new(&matrix, &reference, 25, 0.9).unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        match trial.run(&mut rng) {
            Err(CaptureError::SamplingExhaustion {
                round,
                requested,
                remaining,
            }) => {
                assert_eq!(round, 1);
                assert_eq!(requested, 25);
                assert_eq!(remaining, 20);
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
    }

    #[test]
    fn test_exhaustion_on_partial_final_batch() {
        // 20 samples, batch 6: after 18 drawn only 2 remain, so a threshold
        // that is not met before then must fail on round 4
        let matrix = random_matrix(11, 20, 40);
        let reference = matrix.reference_frequencies().unwrap();
        let trial = BootstrapTrial::new(&matrix, &reference, 6, 1.0).unwrap();

        let mut rng = StdRng::seed_from_u64(5);
        match trial.run(&mut rng) {
            Ok(outcome) => assert!(outcome.rounds <= 3),
            Err(CaptureError::SamplingExhaustion { round, remaining, .. }) => {
                assert_eq!(round, 4);
                assert_eq!(remaining, 2);
            }
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    #[test]
    fn test_threshold_one_terminates_when_batch_divides_population() {
        let matrix = random_matrix(13, 20, 30);
        let reference = matrix.reference_frequencies().unwrap();
        let trial = BootstrapTrial::new(&matrix, &reference, 5, 1.0).unwrap();

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let outcome = trial.run(&mut rng).unwrap();
            assert!(outcome.rounds >= 1 && outcome.rounds <= 4);
            assert_eq!(outcome.samples_drawn, outcome.rounds * 5);
        }
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let matrix = random_matrix(17, 30, 25);
        let reference = matrix.reference_frequencies().unwrap();
        let trial = BootstrapTrial::new(&matrix, &reference, 3, 0.9).unwrap();

        let a = trial.run(&mut StdRng::seed_from_u64(99)).unwrap();
        let b = trial.run(&mut StdRng::seed_from_u64(99)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_larger_subsets_explain_more_on_average() {
        let matrix = random_matrix(23, 20, 40);
        let reference = matrix.reference_frequencies().unwrap();
        let trial = BootstrapTrial::new(&matrix, &reference, 1, 0.9).unwrap();

        let mut small = 0.0;
        let mut large = 0.0;
        let reps = 200;
        for seed in 0..reps {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut order: Vec<usize> = (0..20).collect();
            order.shuffle(&mut rng);
            // the larger set is a superset of the smaller one
            small += trial.evaluate(&order[..4]).unwrap();
            large += trial.evaluate(&order[..12]).unwrap();
        }

        assert!(
            large / reps as f64 >= small / reps as f64,
            "mean R² fell from {} to {}",
            small / reps as f64,
            large / reps as f64
        );
    }

    #[test]
    fn test_constant_subset_scores_zero() {
        // S1 is hom-ref everywhere, so its own profile has no variance
        let matrix = matrix_from_dosages(&[vec![0, 0, 0], vec![2, 1, 0], vec![1, 2, 0]]);
        let reference = matrix.reference_frequencies().unwrap();
        let trial = BootstrapTrial::new(&matrix, &reference, 1, 0.9).unwrap();
        assert_eq!(trial.evaluate(&[0]).unwrap(), 0.0);
    }

    #[test]
    fn test_missing_calls_leaving_constant_reference_score_zero() {
        // reference is [1.0, 0.5, 0.5]; S1 is uncalled at site 1, so it pairs
        // only with the two sites where the reference is 0.5
        let matrix = matrix_from_calls(vec![
            vec![GenotypeCall::MISSING, GenotypeCall::hom_ref(), GenotypeCall::het()],
            vec![GenotypeCall::hom_alt(), GenotypeCall::hom_alt(), GenotypeCall::het()],
        ]);
        let reference = matrix.reference_frequencies().unwrap();
        assert_eq!(reference.values(), &[Some(1.0), Some(0.5), Some(0.5)]);

        let trial = BootstrapTrial::new(&matrix, &reference, 1, 0.9).unwrap();
        assert_eq!(trial.evaluate(&[0]).unwrap(), 0.0);

        // Neither sample alone reaches 0.9, both together give R² = 1
        for seed in 0..10 {
            let outcome = trial.run(&mut StdRng::seed_from_u64(seed)).unwrap();
            assert_eq!(outcome.rounds, 2);
            assert_eq!(outcome.r_squared, 1.0);
        }
    }

    #[test]
    fn test_trials_with_missing_calls() {
        let matrix = random_matrix_with_missing(31, 20, 40, 0.2);
        let reference = matrix.reference_frequencies().unwrap();

        for threshold in [0.8, 0.95, 1.0] {
            let trial = BootstrapTrial::new(&matrix, &reference, 5, threshold).unwrap();
            for seed in 0..20 {
                let outcome = trial.run(&mut StdRng::seed_from_u64(seed)).unwrap();
                assert!(outcome.rounds >= 1 && outcome.rounds <= 4);
                assert!(outcome.r_squared >= threshold);
            }
        }
    }

    #[test]
    fn test_cancelled_trial_stops() {
        let matrix = random_matrix(41, 20, 30);
        let reference = matrix.reference_frequencies().unwrap();
        let cancel = AtomicBool::new(false);
        let trial = BootstrapTrial::new(&matrix, &reference, 1, 1.0)
            .unwrap()
            .with_cancel(&cancel);

        assert!(!trial.is_cancelled());
        cancel.store(true, Ordering::Relaxed);
        assert!(matches!(
            trial.run(&mut StdRng::seed_from_u64(3)),
            Err(CaptureError::Cancelled { round: 1 })
        ));
    }

    #[test]
    fn test_constant_reference_rejected() {
        let matrix = matrix_from_dosages(&[vec![1, 1, 1], vec![1, 1, 1]]);
        let reference = matrix.reference_frequencies().unwrap();
        assert!(matches!(
            BootstrapTrial::new(&matrix, &reference, 1, 0.9),
            Err(CaptureError::Computation(_))
        ));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let matrix = random_matrix(1, 10, 10);
        let reference = matrix.reference_frequencies().unwrap();
        assert!(matches!(
            BootstrapTrial::new(&matrix, &reference, 0, 0.9),
            Err(CaptureError::Parameter(_))
        ));
        assert!(matches!(
            BootstrapTrial::new(&matrix, &reference, 2, 0.0),
            Err(CaptureError::Parameter(_))
        ));
        assert!(matches!(
            BootstrapTrial::new(&matrix, &reference, 2, 1.5),
            Err(CaptureError::Parameter(_))
        ));
    }
}
