//! # Bayesian
//!
//! A naive Bayes text classifier over word-presence features, with pluggable
//! count storage.
//!
//! ## Features
//!
//! - Documents as free text, explicit feature lists, or keyed objects
//! - Smoothed likelihoods with a configurable prior and weight
//! - Per-category confidence thresholds with a default fallback category
//! - In-memory, file-backed, and asynchronous actor storage backends
//! - Atomic batch training; readers never see half a batch
//! - K-fold cross-validation
//!
//! ## Example
//!
//! ```
//! use bayesian::prelude::*;
//!
//! # fn main() -> bayesian::error::Result<()> {
//! let classifier = Classifier::new(ClassifierConfig::default())?;
//! classifier.train("cheap replica watches", true)?;
//! classifier.train("I don't know if this works on windows replica", false)?;
//!
//! let category = classifier.classify("free watches")?;
//! assert_eq!(category, Category::from(true));
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod classifier;
pub mod cli;
pub mod error;
pub mod evaluation;
pub mod storage;
pub mod types;

pub mod prelude {
    pub use crate::analysis::{Document, FeatureExtractor};
    pub use crate::classifier::{
        BackendConfig, Classification, Classifier, ClassifierConfig, Sample,
    };
    pub use crate::error::{BayesianError, Result};
    pub use crate::evaluation::{CrossValidationReport, cross_validate};
    pub use crate::storage::{
        ActorBackend, AsyncBackend, Backend, FileBackend, MemoryBackend, SyncBackend,
    };
    pub use crate::types::{BackendState, Category, FeatureSet, Thresholds};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
