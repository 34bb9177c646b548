//! Naive Bayes classification over presence features.
//!
//! # Architecture
//!
//! - [`aggregate`]: turns labeled samples into one batch of count increments
//! - [`estimator::Estimator`]: smoothed per-feature likelihoods and per-category scores
//! - [`decision::DecisionPolicy`]: best category with a confidence veto
//! - [`bayesian::Classifier`]: the facade wiring these to a backend
//!
//! # Example
//!
//! ```
//! use bayesian::classifier::{Classifier, ClassifierConfig};
//!
//! # fn main() -> bayesian::error::Result<()> {
//! let classifier = Classifier::new(ClassifierConfig::default())?;
//! classifier.train("cheap replica watches", true)?;
//! classifier.train("I don't know if this works on windows replica", false)?;
//!
//! assert_eq!(classifier.classify("free watches")?.as_str(), "true");
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod bayesian;
pub mod config;
pub mod decision;
pub mod estimator;

pub use aggregate::{Sample, aggregate};
pub use bayesian::Classifier;
pub use config::{BackendConfig, ClassifierConfig};
pub use decision::{Classification, DecisionPolicy};
pub use estimator::Estimator;
