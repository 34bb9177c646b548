//! Category selection with a confidence veto.

use serde::Serialize;

use crate::types::{Category, Scores, Thresholds};

/// The outcome of classifying one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    /// The returned category: the winner, or the default category.
    pub category: Category,
    /// The highest-scoring category, if any scored above zero.
    pub best: Option<Category>,
    /// Score of `best`, or 0.0.
    pub best_score: f64,
    /// Whether another category's weighted score overruled the winner.
    pub vetoed: bool,
    /// Raw score of every known category.
    pub scores: Scores,
}

/// Picks the winning category from a score map.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionPolicy {
    default_category: Category,
    thresholds: Thresholds,
}

impl DecisionPolicy {
    pub fn new(default_category: Category, thresholds: Thresholds) -> Self {
        DecisionPolicy {
            default_category,
            thresholds,
        }
    }

    pub fn default_category(&self) -> &Category {
        &self.default_category
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn set_thresholds(&mut self, thresholds: Thresholds) {
        self.thresholds = thresholds;
    }

    /// Veto multiplier for a category; 1.0 when unset.
    pub fn threshold(&self, category: &Category) -> f64 {
        self.thresholds.get(category).copied().unwrap_or(1.0)
    }

    /// Return only the chosen category.
    pub fn decide(&self, scores: &Scores) -> Category {
        self.select(scores).0
    }

    /// Choose a category and keep the evidence.
    ///
    /// The best category is the first, in category order, with the highest
    /// score strictly above zero. It is returned unless some other category
    /// `c` satisfies `score(c) * threshold(winner) > best_score`.
    pub fn evaluate(&self, scores: Scores) -> Classification {
        let (category, best, best_score, vetoed) = self.select(&scores);
        Classification {
            category,
            best,
            best_score,
            vetoed,
            scores,
        }
    }

    fn select(&self, scores: &Scores) -> (Category, Option<Category>, f64, bool) {
        let mut best: Option<&Category> = None;
        let mut best_score = 0.0;
        for (category, &score) in scores {
            if score > best_score {
                best = Some(category);
                best_score = score;
            }
        }

        let Some(winner) = best else {
            return (self.default_category.clone(), None, 0.0, false);
        };

        let threshold = self.threshold(winner);
        let vetoed = scores
            .iter()
            .any(|(category, &score)| category != winner && score * threshold > best_score);

        let category = if vetoed {
            self.default_category.clone()
        } else {
            winner.clone()
        };
        (category, Some(winner.clone()), best_score, vetoed)
    }
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        DecisionPolicy::new(Category::unclassified(), Thresholds::new())
    }
}
