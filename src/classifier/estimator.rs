//! Smoothed likelihood estimation and per-category scoring.

use std::collections::BTreeMap;

use crate::types::{Category, CategoryCounts, FeatureSet, Scores, WordCounts};

/// Weighted-average estimator of `P(feature | category)`.
///
/// The estimate blends an assumed prior with the observed frequency,
/// giving the prior `weight` virtual observations:
///
/// ```text
/// (weight * assumed + total * raw) / (weight + total)
/// ```
///
/// where `raw` is the fraction of the category's documents containing the
/// feature and `total` is the number of documents in any known category
/// containing it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimator {
    weight: f64,
    assumed: f64,
}

impl Estimator {
    pub fn new(weight: f64, assumed: f64) -> Self {
        Estimator { weight, assumed }
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn assumed(&self) -> f64 {
        self.assumed
    }

    /// Smoothed probability that a document of `category` contains a feature
    /// with the given per-category `counts`.
    pub fn word_probability(
        &self,
        category: &Category,
        categories: &CategoryCounts,
        counts: &BTreeMap<Category, u64>,
    ) -> f64 {
        let category_total = categories.get(category).copied().unwrap_or(0);
        let in_category = counts.get(category).copied().unwrap_or(0);

        let raw = if category_total == 0 {
            0.0
        } else {
            // Counts above the category total only come from corrupt state.
            (in_category as f64 / category_total as f64).min(1.0)
        };

        // Summed as floats so large imported totals cannot overflow.
        let total: f64 = categories
            .keys()
            .filter_map(|known| counts.get(known))
            .map(|&count| count as f64)
            .sum();

        let denominator = self.weight + total;
        if denominator <= 0.0 {
            return self.assumed;
        }
        (self.weight * self.assumed + total * raw) / denominator
    }

    /// Score every known category for a feature set.
    ///
    /// A score is the category prior times the product of the smoothed
    /// likelihoods of the features. Features never seen in training use the
    /// assumed probability for every category.
    pub fn category_scores(
        &self,
        categories: &CategoryCounts,
        features: &FeatureSet,
        word_counts: &WordCounts,
    ) -> Scores {
        let total_documents: f64 = categories.values().map(|&count| count as f64).sum();
        let unseen = BTreeMap::new();

        categories
            .iter()
            .map(|(category, &count)| {
                let prior = if total_documents == 0.0 {
                    0.0
                } else {
                    count as f64 / total_documents
                };

                let likelihood: f64 = features
                    .iter()
                    .map(|feature| {
                        let counts = word_counts.get(feature).unwrap_or(&unseen);
                        self.word_probability(category, categories, counts)
                    })
                    .product();

                (category.clone(), prior * likelihood)
            })
            .collect()
    }
}

impl Default for Estimator {
    fn default() -> Self {
        Estimator::new(1.0, 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn categories(entries: &[(&str, u64)]) -> CategoryCounts {
        entries
            .iter()
            .map(|(name, count)| (Category::from(*name), *count))
            .collect()
    }

    fn counts(entries: &[(&str, u64)]) -> BTreeMap<Category, u64> {
        categories(entries)
    }

    #[test]
    fn test_unseen_feature_uses_assumed_probability() {
        let estimator = Estimator::default();
        let cats = categories(&[("true", 1), ("false", 1)]);
        let p = estimator.word_probability(&Category::from("true"), &cats, &BTreeMap::new());
        assert!((p - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_weighted_average() {
        let estimator = Estimator::default();
        let cats = categories(&[("true", 1), ("false", 1)]);
        let watches = counts(&[("true", 1)]);

        let p_true = estimator.word_probability(&Category::from("true"), &cats, &watches);
        let p_false = estimator.word_probability(&Category::from("false"), &cats, &watches);
        assert!((p_true - 0.75).abs() < EPSILON);
        assert!((p_false - 0.25).abs() < EPSILON);
    }

    #[test]
    fn test_probability_stays_in_unit_interval() {
        let estimator = Estimator::new(2.0, 0.9);
        let cats = categories(&[("a", 3), ("b", 5)]);
        for observed in [0, 1, 3, 7] {
            let c = counts(&[("a", observed), ("b", 5)]);
            for category in cats.keys() {
                let p = estimator.word_probability(category, &cats, &c);
                assert!((0.0..=1.0).contains(&p), "{p} out of range");
            }
        }
    }

    #[test]
    fn test_unknown_categories_do_not_contribute() {
        let estimator = Estimator::default();
        let cats = categories(&[("a", 2)]);
        let c = counts(&[("a", 1), ("ghost", 10)]);
        let p = estimator.word_probability(&Category::from("a"), &cats, &c);
        // total = 1, raw = 0.5
        assert!((p - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_category_scores() {
        let estimator = Estimator::default();
        let cats = categories(&[("true", 1), ("false", 1)]);
        let mut word_counts = WordCounts::new();
        word_counts.insert("watches".to_string(), counts(&[("true", 1)]));

        let features: FeatureSet = ["free", "watches"].into_iter().collect();
        let scores = estimator.category_scores(&cats, &features, &word_counts);

        assert!((scores[&Category::from("true")] - 0.1875).abs() < EPSILON);
        assert!((scores[&Category::from("false")] - 0.0625).abs() < EPSILON);
    }

    #[test]
    fn test_no_categories_no_scores() {
        let estimator = Estimator::default();
        let features: FeatureSet = ["anything"].into_iter().collect();
        let scores = estimator.category_scores(&CategoryCounts::new(), &features, &WordCounts::new());
        assert!(scores.is_empty());
    }

    #[test]
    fn test_totals_past_u64_range() {
        let estimator = Estimator::default();
        let cats = categories(&[("a", u64::MAX), ("b", u64::MAX)]);
        let word = counts(&[("a", u64::MAX), ("b", u64::MAX)]);
        let mut word_counts = WordCounts::new();
        word_counts.insert("w".to_string(), word);
        let features: FeatureSet = ["w"].into_iter().collect();

        let scores = estimator.category_scores(&cats, &features, &word_counts);
        assert!((scores[&Category::from("a")] - 0.5).abs() < 1e-9);
        assert!((scores[&Category::from("b")] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_feature_set_scores_are_priors() {
        let estimator = Estimator::default();
        let cats = categories(&[("a", 3), ("b", 1)]);
        let scores = estimator.category_scores(&cats, &FeatureSet::new(), &WordCounts::new());
        assert!((scores[&Category::from("a")] - 0.75).abs() < EPSILON);
        assert!((scores[&Category::from("b")] - 0.25).abs() < EPSILON);
    }
}
