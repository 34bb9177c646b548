//! Core data model shared by the estimator, the aggregator and the backends.

use std::collections::BTreeMap;
use std::fmt;

use ahash::AHashSet;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{BayesianError, Result};

/// Label returned when no category is confident enough.
pub const UNCLASSIFIED: &str = "unclassified";

/// An opaque category label.
///
/// Labels are compared as strings, so `Category::from(true)` and
/// `Category::from("true")` are the same category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// Create a category from any string-like label.
    pub fn new<S: Into<String>>(label: S) -> Self {
        Category(label.into())
    }

    /// The reserved fallback category.
    pub fn unclassified() -> Self {
        Category(UNCLASSIFIED.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::unclassified()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(label: &str) -> Self {
        Category(label.to_string())
    }
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        Category(label)
    }
}

impl From<&String> for Category {
    fn from(label: &String) -> Self {
        Category(label.clone())
    }
}

impl From<bool> for Category {
    fn from(flag: bool) -> Self {
        Category(flag.to_string())
    }
}

impl From<i64> for Category {
    fn from(value: i64) -> Self {
        Category(value.to_string())
    }
}

impl From<u32> for Category {
    fn from(value: u32) -> Self {
        Category(value.to_string())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // Binary formats are not self-describing; labels are always stored as strings there.
        if !deserializer.is_human_readable() {
            return String::deserialize(deserializer).map(Category);
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawCategory {
            Text(String),
            Flag(bool),
            Integer(i64),
            Real(f64),
        }

        Ok(match RawCategory::deserialize(deserializer)? {
            RawCategory::Text(label) => Category(label),
            RawCategory::Flag(flag) => Category::from(flag),
            RawCategory::Integer(value) => Category::from(value),
            RawCategory::Real(value) => Category(value.to_string()),
        })
    }
}

/// A discrete token derived from a document.
pub type Feature = String;

/// Number of training documents per category.
pub type CategoryCounts = BTreeMap<Category, u64>;

/// Per-feature, per-category document counts.
pub type WordCounts = BTreeMap<Feature, BTreeMap<Category, u64>>;

/// Veto multipliers per category. Missing entries mean 1.0.
pub type Thresholds = BTreeMap<Category, f64>;

/// Unnormalized posterior score per category.
pub type Scores = BTreeMap<Category, f64>;

/// The unique features of one document.
///
/// Insertion order is kept (first occurrence wins) so that score products are
/// always evaluated in the same order for the same document. Equality ignores
/// order.
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    features: Vec<Feature>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of unique features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn contains(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    pub fn as_slice(&self) -> &[Feature] {
        &self.features
    }

    pub fn into_vec(self) -> Vec<Feature> {
        self.features
    }
}

impl<S: Into<Feature>> FromIterator<S> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut seen = AHashSet::new();
        let mut features = Vec::new();
        for feature in iter {
            let feature = feature.into();
            if seen.insert(feature.clone()) {
                features.push(feature);
            }
        }
        FeatureSet { features }
    }
}

impl<'a> IntoIterator for &'a FeatureSet {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

impl PartialEq for FeatureSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|f| other.contains(f))
    }
}

impl Eq for FeatureSet {}

/// Increments produced by the aggregator for one training batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountIncrements {
    /// One increment per sample, keyed by its category.
    pub categories: CategoryCounts,
    /// One increment per unique (feature, category) pair of each sample.
    pub words: WordCounts,
}

impl CountIncrements {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Number of documents represented by this batch.
    pub fn document_count(&self) -> u64 {
        self.categories.values().fold(0, |sum, &count| sum.saturating_add(count))
    }
}

/// The full persisted state of a backend.
///
/// This is the value produced by `export_state` and consumed by `import_state`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendState {
    #[serde(rename = "cats", alias = "categories")]
    pub categories: CategoryCounts,
    #[serde(rename = "words", default)]
    pub words: WordCounts,
}

impl BackendState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a whole batch of increments.
    pub fn apply(&mut self, increments: &CountIncrements) {
        for (category, count) in &increments.categories {
            let total = self.categories.entry(category.clone()).or_insert(0);
            *total = total.saturating_add(*count);
        }
        for (feature, per_category) in &increments.words {
            let entry = self.words.entry(feature.clone()).or_default();
            for (category, count) in per_category {
                let total = entry.entry(category.clone()).or_insert(0);
                *total = total.saturating_add(*count);
            }
        }
    }

    /// Counts for the requested features, restricted to the given categories.
    ///
    /// Features never seen in training are omitted; categories absent from
    /// storage contribute nothing.
    pub fn word_counts(&self, features: &FeatureSet, categories: &CategoryCounts) -> WordCounts {
        let mut counts = WordCounts::new();
        for feature in features {
            let Some(per_category) = self.words.get(feature) else {
                continue;
            };
            let filtered: BTreeMap<Category, u64> = per_category
                .iter()
                .filter(|(category, count)| **count > 0 && categories.contains_key(*category))
                .map(|(category, count)| (category.clone(), *count))
                .collect();
            if !filtered.is_empty() {
                counts.insert(feature.clone(), filtered);
            }
        }
        counts
    }

    /// Total number of training documents.
    pub fn total_documents(&self) -> u64 {
        self.categories.values().fold(0, |sum, &count| sum.saturating_add(count))
    }

    /// Number of distinct features ever observed.
    pub fn vocabulary_size(&self) -> usize {
        self.words.len()
    }

    /// Check the count invariants: every category in the word counts is known,
    /// and no word count exceeds its category total.
    pub fn validate(&self) -> Result<()> {
        for (feature, per_category) in &self.words {
            for (category, count) in per_category {
                let Some(total) = self.categories.get(category) else {
                    return Err(BayesianError::backend(format!(
                        "feature '{feature}' counts unknown category '{category}'"
                    )));
                };
                if count > total {
                    return Err(BayesianError::backend(format!(
                        "feature '{feature}' has {count} documents in '{category}' but the category has {total}"
                    )));
                }
            }
        }
        Ok(())
    }
}
