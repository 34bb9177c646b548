//! Regex-based tokenizer implementation.

use std::sync::Arc;

use regex::Regex;

use super::Tokenizer;
use crate::analysis::token::{Token, TokenStream};
use crate::error::{BayesianError, Result};

/// Pattern separating tokens in free text: any run of non-word characters.
///
/// Word characters follow Unicode, so accented letters stay inside their
/// token ("café" is one feature). An ASCII-only `\W` would split it into
/// "caf"; models trained by such a tokenizer will not share those features.
pub const NON_WORD_PATTERN: &str = r"\W+";

/// A regex-based tokenizer.
///
/// In match mode the tokens are the regex matches; in gap mode the regex
/// describes separators and the tokens are the non-empty text between them.
#[derive(Clone, Debug)]
pub struct RegexTokenizer {
    /// The regex pattern used to extract tokens
    pattern: Arc<Regex>,
    /// Whether to extract gaps (text between matches) instead of matches
    gaps: bool,
}

impl RegexTokenizer {
    /// Create a tokenizer matching runs of word characters (`\w+`).
    pub fn new() -> Result<Self> {
        Self::with_pattern(r"\w+")
    }

    /// Create a tokenizer that splits on runs of non-word characters.
    ///
    /// This is the tokenizer the feature extractor uses for text documents.
    pub fn non_word_gaps() -> Result<Self> {
        Self::with_gaps(NON_WORD_PATTERN)
    }

    /// Create a new regex tokenizer with a custom pattern.
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        Ok(RegexTokenizer {
            pattern: Arc::new(compile(pattern)?),
            gaps: false,
        })
    }

    /// Create a tokenizer that extracts gaps (text between matches) instead of matches.
    pub fn with_gaps(pattern: &str) -> Result<Self> {
        Ok(RegexTokenizer {
            pattern: Arc::new(compile(pattern)?),
            gaps: true,
        })
    }

    /// Get the regex pattern used by this tokenizer.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Check if this tokenizer extracts gaps.
    pub fn gaps(&self) -> bool {
        self.gaps
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| BayesianError::analysis(format!("Invalid regex pattern: {e}")))
}

impl Default for RegexTokenizer {
    fn default() -> Self {
        Self::non_word_gaps().expect("Default regex pattern should be valid")
    }
}

impl Tokenizer for RegexTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let tokens = if self.gaps {
            let mut tokens = Vec::new();
            let mut last_end = 0;

            for mat in self.pattern.find_iter(text) {
                if mat.start() > last_end {
                    let gap = &text[last_end..mat.start()];
                    tokens.push(Token::with_offsets(gap, tokens.len(), last_end, mat.start()));
                }
                last_end = mat.end();
            }

            if last_end < text.len() {
                tokens.push(Token::with_offsets(
                    &text[last_end..],
                    tokens.len(),
                    last_end,
                    text.len(),
                ));
            }

            tokens
        } else {
            self.pattern
                .find_iter(text)
                .enumerate()
                .map(|(position, mat)| {
                    Token::with_offsets(mat.as_str(), position, mat.start(), mat.end())
                })
                .collect()
        };

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "regex"
    }
}
