//! K-fold cross-validation.
//!
//! # Example
//!
//! ```
//! use bayesian::classifier::{Classifier, ClassifierConfig, Sample};
//! use bayesian::evaluation::cross_validate;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let data: Vec<Sample> = (0..12)
//!     .map(|i| {
//!         if i % 2 == 0 {
//!             Sample::new("cheap replica watches", "spam")
//!         } else {
//!             Sample::new("meeting notes attached", "ham")
//!         }
//!     })
//!     .collect();
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let report = cross_validate(
//!     || Classifier::new(ClassifierConfig::default()),
//!     &data,
//!     3,
//!     &mut rng,
//! )
//! .unwrap();
//! assert_eq!(report.folds, 3);
//! assert_eq!(report.error, 0.0);
//! ```

use std::time::{Duration, Instant};

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::classifier::aggregate::Sample;
use crate::classifier::bayesian::Classifier;
use crate::error::{BayesianError, Result};

/// Number of folds used when none is given.
pub const DEFAULT_FOLDS: usize = 3;

/// Outcome of one train/test partition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoldResult {
    pub error: f64,
    pub train_size: usize,
    pub test_size: usize,
    #[serde(with = "millis")]
    pub train_time: Duration,
    #[serde(with = "millis")]
    pub test_time: Duration,
}

/// Averages over all folds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossValidationReport {
    pub folds: usize,
    /// Mean misclassification rate.
    pub error: f64,
    /// Mean training set size.
    pub train_size: f64,
    /// Mean test set size.
    pub test_size: f64,
    #[serde(with = "millis")]
    pub train_time: Duration,
    #[serde(with = "millis")]
    pub test_time: Duration,
    pub fold_results: Vec<FoldResult>,
}

mod millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
    }
}

/// Shuffle `data`, split it into `folds` contiguous partitions, and for each
/// one train a fresh classifier from `factory` on the rest and test it on the
/// partition.
///
/// `folds` must be between 2 and the number of samples.
pub fn cross_validate<F, R>(
    mut factory: F,
    data: &[Sample],
    folds: usize,
    rng: &mut R,
) -> Result<CrossValidationReport>
where
    F: FnMut() -> Result<Classifier>,
    R: Rng + ?Sized,
{
    if folds < 2 || folds > data.len() {
        return Err(BayesianError::invalid_config(format!(
            "cross-validation needs between 2 and {} folds, got {folds}",
            data.len()
        )));
    }

    let mut shuffled = data.to_vec();
    shuffled.shuffle(rng);

    let mut fold_results = Vec::with_capacity(folds);
    for fold in 0..folds {
        let start = fold * shuffled.len() / folds;
        let end = (fold + 1) * shuffled.len() / folds;

        let test_set = &shuffled[start..end];
        let train_set: Vec<Sample> = shuffled[..start]
            .iter()
            .chain(&shuffled[end..])
            .cloned()
            .collect();

        let classifier = factory()?;

        let train_start = Instant::now();
        classifier.train_all(&train_set)?;
        let train_time = train_start.elapsed();

        let test_start = Instant::now();
        let error = classifier.test(test_set)?;
        let test_time = test_start.elapsed();

        log::info!(
            "Fold {}/{}: error {:.4} ({} train, {} test)",
            fold + 1,
            folds,
            error,
            train_set.len(),
            test_set.len()
        );

        fold_results.push(FoldResult {
            error,
            train_size: train_set.len(),
            test_size: test_set.len(),
            train_time,
            test_time,
        });
    }

    let n = folds as f64;
    Ok(CrossValidationReport {
        folds,
        error: fold_results.iter().map(|r| r.error).sum::<f64>() / n,
        train_size: fold_results.iter().map(|r| r.train_size as f64).sum::<f64>() / n,
        test_size: fold_results.iter().map(|r| r.test_size as f64).sum::<f64>() / n,
        train_time: fold_results.iter().map(|r| r.train_time).sum::<Duration>() / folds as u32,
        test_time: fold_results.iter().map(|r| r.test_time).sum::<Duration>() / folds as u32,
        fold_results,
    })
}
