//! In-memory backend.

use parking_lot::RwLock;

use crate::error::Result;
use crate::storage::traits::SyncBackend;
use crate::types::{BackendState, CategoryCounts, CountIncrements, FeatureSet, WordCounts};

/// An in-memory count table.
///
/// Reads share one `RwLock`; a whole increment batch is applied under a single
/// write guard, so readers never see part of a batch.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    table: RwLock<BackendState>,
}

impl MemoryBackend {
    /// Create an empty memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory backend restored from a snapshot.
    pub fn from_state(state: BackendState) -> Result<Self> {
        state.validate()?;
        Ok(MemoryBackend {
            table: RwLock::new(state),
        })
    }

    /// Total number of training documents.
    pub fn document_count(&self) -> u64 {
        self.table.read().total_documents()
    }

    /// Drop every count.
    pub fn clear(&self) {
        *self.table.write() = BackendState::default();
    }
}

impl SyncBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn categories(&self) -> Result<CategoryCounts> {
        Ok(self.table.read().categories.clone())
    }

    fn word_counts(
        &self,
        features: &FeatureSet,
        categories: &CategoryCounts,
    ) -> Result<WordCounts> {
        Ok(self.table.read().word_counts(features, categories))
    }

    fn read_snapshot(&self, features: &FeatureSet) -> Result<(CategoryCounts, WordCounts)> {
        let table = self.table.read();
        let counts = table.word_counts(features, &table.categories);
        Ok((table.categories.clone(), counts))
    }

    fn increment_counts(&self, increments: &CountIncrements) -> Result<()> {
        self.table.write().apply(increments);
        Ok(())
    }

    fn export_state(&self) -> Result<BackendState> {
        Ok(self.table.read().clone())
    }

    fn import_state(&self, state: BackendState) -> Result<()> {
        state.validate()?;
        *self.table.write() = state;
        Ok(())
    }
}
