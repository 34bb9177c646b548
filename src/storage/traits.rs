//! Backend contract and capability flag.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::storage::memory::MemoryBackend;
use crate::types::{BackendState, CategoryCounts, CountIncrements, FeatureSet, WordCounts};

/// A backend whose operations complete inline.
///
/// `increment_counts` must apply a whole batch atomically: no concurrent call
/// to any method of the same backend may observe part of a batch.
pub trait SyncBackend: Send + Sync + Debug {
    /// Name of this backend type, for logging.
    fn name(&self) -> &'static str;

    /// Number of training documents per category.
    fn categories(&self) -> Result<CategoryCounts>;

    /// Counts for the requested features. Categories not in `categories`
    /// contribute nothing; unseen features are omitted.
    fn word_counts(
        &self,
        features: &FeatureSet,
        categories: &CategoryCounts,
    ) -> Result<WordCounts>;

    /// Category totals and word counts read from one consistent view.
    ///
    /// The default performs two reads; backends that can do better override it.
    fn read_snapshot(&self, features: &FeatureSet) -> Result<(CategoryCounts, WordCounts)> {
        let categories = self.categories()?;
        let counts = self.word_counts(features, &categories)?;
        Ok((categories, counts))
    }

    /// Apply one batch of increments atomically.
    fn increment_counts(&self, increments: &CountIncrements) -> Result<()>;

    /// Snapshot the whole state.
    fn export_state(&self) -> Result<BackendState>;

    /// Replace the whole state with a snapshot produced by `export_state`.
    fn import_state(&self, state: BackendState) -> Result<()>;
}

/// A backend whose operations suspend at I/O.
///
/// Carries the same atomicity obligations as [`SyncBackend`].
#[async_trait]
pub trait AsyncBackend: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    async fn categories(&self) -> Result<CategoryCounts>;

    async fn word_counts(
        &self,
        features: &FeatureSet,
        categories: &CategoryCounts,
    ) -> Result<WordCounts>;

    /// Category totals and word counts read from one consistent view.
    ///
    /// The default issues two requests, and a batch committed between them
    /// would be half visible. Backends shared by concurrent trainers must
    /// override it.
    async fn read_snapshot(&self, features: &FeatureSet) -> Result<(CategoryCounts, WordCounts)> {
        let categories = self.categories().await?;
        let counts = self.word_counts(features, &categories).await?;
        Ok((categories, counts))
    }

    async fn increment_counts(&self, increments: &CountIncrements) -> Result<()>;

    async fn export_state(&self) -> Result<BackendState>;

    async fn import_state(&self, state: BackendState) -> Result<()>;
}

/// Whether a backend completes inline or asynchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Synchronous,
    Asynchronous,
}

/// A storage backend together with its declared capability.
#[derive(Debug, Clone)]
pub enum Backend {
    Sync(Arc<dyn SyncBackend>),
    Async(Arc<dyn AsyncBackend>),
}

impl Backend {
    /// A fresh in-memory backend.
    pub fn memory() -> Self {
        Backend::Sync(Arc::new(MemoryBackend::new()))
    }

    pub fn capability(&self) -> Capability {
        match self {
            Backend::Sync(_) => Capability::Synchronous,
            Backend::Async(_) => Capability::Asynchronous,
        }
    }

    pub fn is_async(&self) -> bool {
        self.capability() == Capability::Asynchronous
    }

    pub fn name(&self) -> &'static str {
        match self {
            Backend::Sync(backend) => backend.name(),
            Backend::Async(backend) => backend.name(),
        }
    }
}

impl<B: SyncBackend + 'static> From<Arc<B>> for Backend {
    fn from(backend: Arc<B>) -> Self {
        Backend::Sync(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_backend_is_synchronous() {
        let backend = Backend::memory();
        assert_eq!(backend.capability(), Capability::Synchronous);
        assert!(!backend.is_async());
        assert_eq!(backend.name(), "memory");
    }

    #[test]
    fn test_read_snapshot() {
        let backend = MemoryBackend::new();
        let mut increments = CountIncrements::default();
        increments.categories.insert("spam".into(), 1);
        increments
            .words
            .entry("cheap".to_string())
            .or_default()
            .insert("spam".into(), 1);
        backend.increment_counts(&increments).unwrap();

        let features: FeatureSet = ["cheap"].into_iter().collect();
        let (categories, counts) = backend.read_snapshot(&features).unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(counts["cheap"].len(), 1);
    }
}
