//! Count aggregation for training batches.

use serde::{Deserialize, Serialize};

use crate::analysis::feature::{Document, FeatureExtractor};
use crate::error::Result;
use crate::types::{Category, CountIncrements};

/// One labeled training or test example.
///
/// Serialized as `{"input": ..., "output": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    #[serde(rename = "input", alias = "document")]
    pub document: Document,
    #[serde(rename = "output", alias = "category")]
    pub category: Category,
}

impl Sample {
    pub fn new<D, C>(document: D, category: C) -> Self
    where
        D: Into<Document>,
        C: Into<Category>,
    {
        Sample {
            document: document.into(),
            category: category.into(),
        }
    }
}

/// Compute the increments for a batch of samples.
///
/// Each sample adds one to its category and one to every unique
/// `(feature, category)` pair it contains. The first document that fails
/// feature extraction aborts the whole batch, so nothing partial reaches a
/// backend.
pub fn aggregate<'a, I>(extractor: &FeatureExtractor, samples: I) -> Result<CountIncrements>
where
    I: IntoIterator<Item = &'a Sample>,
{
    let mut increments = CountIncrements::default();

    for sample in samples {
        let features = extractor.extract(&sample.document)?;

        *increments
            .categories
            .entry(sample.category.clone())
            .or_insert(0) += 1;

        for feature in &features {
            *increments
                .words
                .entry(feature.clone())
                .or_default()
                .entry(sample.category.clone())
                .or_insert(0) += 1;
        }
    }

    Ok(increments)
}
