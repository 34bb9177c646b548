//! Text analysis for the classifier.
//!
//! Documents are turned into presence features in two steps: a [`Tokenizer`]
//! splits text into tokens, and the [`FeatureExtractor`] collapses tokens (or
//! already-discrete inputs) into a [`FeatureSet`](crate::types::FeatureSet).

pub mod feature;
pub mod token;
pub mod tokenizer;

// Re-export commonly used types
pub use feature::{Document, FeatureExtractor};
pub use token::{Token, TokenStream};
pub use tokenizer::Tokenizer;
pub use tokenizer::regex::RegexTokenizer;
