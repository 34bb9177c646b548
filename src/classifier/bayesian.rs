//! The classifier facade.

use std::sync::Arc;
use std::time::Instant;

use futures::future;
use rayon::prelude::*;

use crate::analysis::feature::{Document, FeatureExtractor};
use crate::classifier::aggregate::{Sample, aggregate};
use crate::classifier::config::{ClassifierConfig, validate_thresholds};
use crate::classifier::decision::{Classification, DecisionPolicy};
use crate::classifier::estimator::Estimator;
use crate::error::{BayesianError, Result};
use crate::storage::traits::{Backend, SyncBackend};
use crate::types::{BackendState, Category, CategoryCounts, FeatureSet, Thresholds, WordCounts};

/// A naive Bayes classifier over presence features.
///
/// Operations come in two flavors. The plain methods complete inline and
/// require a synchronous backend; the `_async` methods work with either
/// kind. Calling a plain method on an asynchronous backend fails with
/// [`BayesianError::InvalidOperation`].
#[derive(Debug)]
pub struct Classifier {
    config: ClassifierConfig,
    backend: Backend,
    extractor: FeatureExtractor,
    estimator: Estimator,
    policy: DecisionPolicy,
}

impl Classifier {
    /// Create a classifier and the backend its configuration selects.
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        config.validate()?;
        let backend = config.backend.build()?;
        Self::with_backend(config, backend)
    }

    /// Create a classifier over an existing backend.
    ///
    /// The backend section of `config` is kept for reference but not used.
    pub fn with_backend(config: ClassifierConfig, backend: Backend) -> Result<Self> {
        config.validate()?;
        log::debug!(
            "Creating classifier over {} backend (weight {}, assumed {})",
            backend.name(),
            config.weight,
            config.assumed
        );
        Ok(Classifier {
            estimator: Estimator::new(config.weight, config.assumed),
            policy: DecisionPolicy::new(config.default_category.clone(), config.thresholds.clone()),
            extractor: FeatureExtractor::new(),
            backend,
            config,
        })
    }

    /// Replace the feature extractor.
    pub fn with_extractor(mut self, extractor: FeatureExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn is_async(&self) -> bool {
        self.backend.is_async()
    }

    pub fn default_category(&self) -> &Category {
        self.policy.default_category()
    }

    pub fn thresholds(&self) -> &Thresholds {
        self.policy.thresholds()
    }

    /// Replace all thresholds. Takes effect for subsequent classifications.
    pub fn set_thresholds(&mut self, thresholds: Thresholds) -> Result<()> {
        validate_thresholds(&thresholds)?;
        self.config.thresholds = thresholds.clone();
        self.policy.set_thresholds(thresholds);
        Ok(())
    }

    /// The unique features of a document.
    pub fn features(&self, document: &Document) -> Result<FeatureSet> {
        self.extractor.extract(document)
    }

    fn sync_backend(&self, operation: &str) -> Result<&Arc<dyn SyncBackend>> {
        match &self.backend {
            Backend::Sync(backend) => Ok(backend),
            Backend::Async(backend) => Err(BayesianError::invalid_operation(format!(
                "{operation} needs a synchronous backend, but {} is asynchronous; use {operation}_async",
                backend.name()
            ))),
        }
    }

    fn decide(
        &self,
        categories: &CategoryCounts,
        features: &FeatureSet,
        word_counts: &WordCounts,
    ) -> Classification {
        let scores = self
            .estimator
            .category_scores(categories, features, word_counts);
        let classification = self.policy.evaluate(scores);
        log::debug!(
            "Classified {} features as '{}' (best {:?} at {:.6}, vetoed {})",
            features.len(),
            classification.category,
            classification.best.as_ref().map(Category::as_str),
            classification.best_score,
            classification.vetoed
        );
        classification
    }

    // Synchronous operations

    /// Train on a single labeled document.
    pub fn train<D, C>(&self, document: D, category: C) -> Result<()>
    where
        D: Into<Document>,
        C: Into<Category>,
    {
        self.train_all(&[Sample::new(document, category)])
    }

    /// Train on a batch of samples, applied to the backend as one atomic increment.
    pub fn train_all(&self, samples: &[Sample]) -> Result<()> {
        let backend = self.sync_backend("train_all")?;
        let increments = aggregate(&self.extractor, samples)?;
        if increments.is_empty() {
            return Ok(());
        }
        backend.increment_counts(&increments)?;
        log::debug!(
            "Trained {} documents into {} backend",
            increments.document_count(),
            backend.name()
        );
        Ok(())
    }

    /// Alias of [`Classifier::train_all`].
    pub fn train_batch(&self, samples: &[Sample]) -> Result<()> {
        self.train_all(samples)
    }

    /// Alias of [`Classifier::train`].
    pub fn train_online<D, C>(&self, document: D, category: C) -> Result<()>
    where
        D: Into<Document>,
        C: Into<Category>,
    {
        self.train(document, category)
    }

    /// Classify a document.
    pub fn classify<D: Into<Document>>(&self, document: D) -> Result<Category> {
        Ok(self.classify_detailed(document)?.category)
    }

    /// Classify a document and return the scores behind the decision.
    pub fn classify_detailed<D: Into<Document>>(&self, document: D) -> Result<Classification> {
        let backend = self.sync_backend("classify")?;
        let features = self.extractor.extract(&document.into())?;
        let (categories, word_counts) = backend.read_snapshot(&features)?;
        Ok(self.decide(&categories, &features, &word_counts))
    }

    /// Fraction of samples whose predicted category differs from their label.
    ///
    /// An empty set has an error rate of 0.
    pub fn test(&self, data: &[Sample]) -> Result<f64> {
        self.sync_backend("test")?;
        if data.is_empty() {
            return Ok(0.0);
        }

        let start = Instant::now();
        let misclassified = data
            .par_iter()
            .map(|sample| {
                self.classify(&sample.document)
                    .map(|predicted| predicted != sample.category)
            })
            .collect::<Result<Vec<bool>>>()?
            .into_iter()
            .filter(|&wrong| wrong)
            .count();

        log::debug!(
            "Tested {} samples in {:?}: {} misclassified",
            data.len(),
            start.elapsed(),
            misclassified
        );
        Ok(misclassified as f64 / data.len() as f64)
    }

    /// Snapshot the trained counts.
    pub fn export_state(&self) -> Result<BackendState> {
        self.sync_backend("export_state")?.export_state()
    }

    /// Replace the trained counts with a snapshot.
    pub fn import_state(&self, state: BackendState) -> Result<()> {
        self.sync_backend("import_state")?.import_state(state)
    }

    // Asynchronous operations

    pub async fn train_async<D, C>(&self, document: D, category: C) -> Result<()>
    where
        D: Into<Document>,
        C: Into<Category>,
    {
        self.train_all_async(&[Sample::new(document, category)])
            .await
    }

    pub async fn train_all_async(&self, samples: &[Sample]) -> Result<()> {
        let increments = aggregate(&self.extractor, samples)?;
        if increments.is_empty() {
            return Ok(());
        }
        match &self.backend {
            Backend::Sync(backend) => backend.increment_counts(&increments)?,
            Backend::Async(backend) => backend.increment_counts(&increments).await?,
        }
        log::debug!(
            "Trained {} documents into {} backend",
            increments.document_count(),
            self.backend.name()
        );
        Ok(())
    }

    pub async fn train_batch_async(&self, samples: &[Sample]) -> Result<()> {
        self.train_all_async(samples).await
    }

    pub async fn train_online_async<D, C>(&self, document: D, category: C) -> Result<()>
    where
        D: Into<Document>,
        C: Into<Category>,
    {
        self.train_async(document, category).await
    }

    pub async fn classify_async<D: Into<Document>>(&self, document: D) -> Result<Category> {
        Ok(self.classify_detailed_async(document).await?.category)
    }

    pub async fn classify_detailed_async<D: Into<Document>>(
        &self,
        document: D,
    ) -> Result<Classification> {
        let features = self.extractor.extract(&document.into())?;
        let (categories, word_counts) = match &self.backend {
            Backend::Sync(backend) => backend.read_snapshot(&features)?,
            Backend::Async(backend) => backend.read_snapshot(&features).await?,
        };
        Ok(self.decide(&categories, &features, &word_counts))
    }

    /// Asynchronous [`Classifier::test`]. Samples are classified concurrently.
    pub async fn test_async(&self, data: &[Sample]) -> Result<f64> {
        if data.is_empty() {
            return Ok(0.0);
        }

        let predictions = future::try_join_all(
            data.iter()
                .map(|sample| self.classify_async(&sample.document)),
        )
        .await?;

        let misclassified = predictions
            .iter()
            .zip(data)
            .filter(|(predicted, sample)| **predicted != sample.category)
            .count();
        Ok(misclassified as f64 / data.len() as f64)
    }

    pub async fn export_state_async(&self) -> Result<BackendState> {
        match &self.backend {
            Backend::Sync(backend) => backend.export_state(),
            Backend::Async(backend) => backend.export_state().await,
        }
    }

    pub async fn import_state_async(&self, state: BackendState) -> Result<()> {
        match &self.backend {
            Backend::Sync(backend) => backend.import_state(state),
            Backend::Async(backend) => backend.import_state(state).await,
        }
    }
}
