//! Tokenizers split document text into tokens.
//!
//! # Examples
//!
//! ```
//! use bayesian::analysis::tokenizer::Tokenizer;
//! use bayesian::analysis::tokenizer::regex::RegexTokenizer;
//!
//! let tokenizer = RegexTokenizer::non_word_gaps().unwrap();
//! let tokens: Vec<_> = tokenizer.tokenize("cheap, replica watches").unwrap().collect();
//! assert_eq!(tokens.len(), 3);
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for tokenizers that convert text into tokens.
///
/// The trait requires `Send + Sync` so one tokenizer can serve concurrent
/// classification calls.
pub trait Tokenizer: Send + Sync + std::fmt::Debug {
    /// Tokenize the given text into a stream of tokens.
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this tokenizer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

pub mod regex;
