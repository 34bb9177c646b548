//! Configuration for the classifier and its backend.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{BayesianError, Result};
use crate::storage::actor::{ActorBackend, DEFAULT_CAPACITY};
use crate::storage::file::{FileBackend, FileFormat};
use crate::storage::memory::MemoryBackend;
use crate::storage::traits::{Backend, SyncBackend};
use crate::types::{Category, Thresholds};

/// Backend selection.
///
/// # Example
///
/// ```
/// use bayesian::classifier::BackendConfig;
///
/// let config: BackendConfig = serde_json::from_str(
///     r#"{"type": "actor", "inner": {"type": "file", "path": "model.json"}}"#,
/// ).unwrap();
/// assert!(config.is_async());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// In-process table, lost on exit.
    #[default]
    Memory,
    /// Table mirrored to a state file.
    File {
        path: PathBuf,
        /// Defaults to the format implied by the file extension.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<FileFormat>,
    },
    /// Asynchronous front over a synchronous backend.
    Actor {
        inner: Box<BackendConfig>,
        #[serde(default = "default_capacity")]
        capacity: usize,
    },
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl BackendConfig {
    pub fn is_async(&self) -> bool {
        matches!(self, BackendConfig::Actor { .. })
    }

    /// Construct the configured backend.
    ///
    /// Actor backends must be built inside a tokio runtime.
    pub fn build(&self) -> Result<Backend> {
        match self {
            BackendConfig::Actor { inner, capacity } => {
                let inner = inner.build_sync()?;
                Ok(Backend::Async(Arc::new(ActorBackend::with_capacity(
                    inner, *capacity,
                )?)))
            }
            other => Ok(Backend::Sync(other.build_sync()?)),
        }
    }

    fn build_sync(&self) -> Result<Arc<dyn SyncBackend>> {
        match self {
            BackendConfig::Memory => Ok(Arc::new(MemoryBackend::new())),
            BackendConfig::File { path, format } => {
                let format = format.unwrap_or_else(|| FileFormat::from_path(path));
                Ok(Arc::new(FileBackend::open_with_format(path, format)?))
            }
            BackendConfig::Actor { .. } => Err(BayesianError::invalid_config(
                "an actor backend cannot wrap another actor backend",
            )),
        }
    }
}

/// Classifier configuration.
///
/// Missing fields take their defaults, so `{}` is a valid configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Category returned when no trained category is confident enough.
    #[serde(alias = "default")]
    pub default_category: Category,

    /// How many virtual observations the prior is worth. Must be positive.
    pub weight: f64,

    /// Prior probability of a feature in a category, in `[0, 1]`.
    pub assumed: f64,

    /// Veto multipliers per category. Missing categories use 1.0.
    pub thresholds: Thresholds,

    pub backend: BackendConfig,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            default_category: Category::unclassified(),
            weight: 1.0,
            assumed: 0.5,
            thresholds: Thresholds::new(),
            backend: BackendConfig::Memory,
        }
    }
}

impl ClassifierConfig {
    /// Load a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ClassifierConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_default_category<C: Into<Category>>(mut self, category: C) -> Self {
        self.default_category = category.into();
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_assumed(mut self, assumed: f64) -> Self {
        self.assumed = assumed;
        self
    }

    pub fn with_threshold<C: Into<Category>>(mut self, category: C, threshold: f64) -> Self {
        self.thresholds.insert(category.into(), threshold);
        self
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_backend(mut self, backend: BackendConfig) -> Self {
        self.backend = backend;
        self
    }

    /// Check the numeric ranges.
    pub fn validate(&self) -> Result<()> {
        if !self.weight.is_finite() || self.weight <= 0.0 {
            return Err(BayesianError::invalid_config(format!(
                "weight must be a positive number, got {}",
                self.weight
            )));
        }
        if !(0.0..=1.0).contains(&self.assumed) {
            return Err(BayesianError::invalid_config(format!(
                "assumed must be within [0, 1], got {}",
                self.assumed
            )));
        }
        validate_thresholds(&self.thresholds)
    }
}

/// Every threshold must be a positive finite multiplier.
pub fn validate_thresholds(thresholds: &Thresholds) -> Result<()> {
    for (category, threshold) in thresholds {
        if !threshold.is_finite() || *threshold <= 0.0 {
            return Err(BayesianError::invalid_config(format!(
                "threshold for '{category}' must be positive, got {threshold}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClassifierConfig::default();
        assert_eq!(config.default_category.as_str(), "unclassified");
        assert_eq!(config.weight, 1.0);
        assert_eq!(config.assumed, 0.5);
        assert!(config.thresholds.is_empty());
        assert_eq!(config.backend, BackendConfig::Memory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_json_is_default() {
        let config: ClassifierConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ClassifierConfig::default());
    }

    #[test]
    fn test_json_with_default_alias_and_file_backend() {
        let config: ClassifierConfig = serde_json::from_str(
            r#"{"default": "other", "weight": 3, "thresholds": {"spam": 2.5},
                "backend": {"type": "file", "path": "/tmp/model.bin", "format": "binary"}}"#,
        )
        .unwrap();
        assert_eq!(config.default_category.as_str(), "other");
        assert_eq!(config.weight, 3.0);
        assert_eq!(config.thresholds[&Category::from("spam")], 2.5);
        assert_eq!(
            config.backend,
            BackendConfig::File {
                path: PathBuf::from("/tmp/model.bin"),
                format: Some(FileFormat::Binary),
            }
        );
    }

    #[test]
    fn test_validation_rejects_out_of_range_values() {
        assert!(ClassifierConfig::default().with_weight(0.0).validate().is_err());
        assert!(ClassifierConfig::default().with_weight(f64::NAN).validate().is_err());
        assert!(ClassifierConfig::default().with_assumed(1.5).validate().is_err());
        assert!(ClassifierConfig::default().with_assumed(-0.1).validate().is_err());
        assert!(
            ClassifierConfig::default()
                .with_threshold("spam", 0.0)
                .validate()
                .is_err()
        );
        assert!(ClassifierConfig::default().with_assumed(0.0).validate().is_ok());
    }

    #[test]
    fn test_nested_actor_is_rejected() {
        let config = BackendConfig::Actor {
            inner: Box::new(BackendConfig::Actor {
                inner: Box::new(BackendConfig::Memory),
                capacity: 8,
            }),
            capacity: 8,
        };
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let _guard = runtime.enter();
        assert!(matches!(
            config.build(),
            Err(BayesianError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_build_memory_backend() {
        let backend = BackendConfig::Memory.build().unwrap();
        assert!(!backend.is_async());
    }
}
