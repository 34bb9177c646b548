//! Feature extraction: documents to presence features.
//!
//! Every downstream computation is set based, so a feature used twice in a
//! document counts once.
//!
//! # Examples
//!
//! ```
//! use bayesian::analysis::{Document, FeatureExtractor};
//!
//! let extractor = FeatureExtractor::new();
//! let features = extractor.extract(&Document::from("free free watches")).unwrap();
//! assert_eq!(features.as_slice(), &["free", "watches"]);
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::analysis::tokenizer::Tokenizer;
use crate::analysis::tokenizer::regex::RegexTokenizer;
use crate::error::{BayesianError, Result};
use crate::types::{Feature, FeatureSet};

/// A document accepted for training or classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum Document {
    /// Free text, tokenized on non-word characters.
    Text(String),
    /// Features given explicitly; duplicates are collapsed.
    Features(Vec<Feature>),
    /// A keyed structure whose keys are the features. Values are ignored.
    Keyed(Map<String, Value>),
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Document::Text(text.to_string())
    }
}

impl From<String> for Document {
    fn from(text: String) -> Self {
        Document::Text(text)
    }
}

impl From<&Document> for Document {
    fn from(document: &Document) -> Self {
        document.clone()
    }
}

impl From<Vec<Feature>> for Document {
    fn from(features: Vec<Feature>) -> Self {
        Document::Features(features)
    }
}

impl From<&[&str]> for Document {
    fn from(features: &[&str]) -> Self {
        Document::Features(features.iter().map(|f| f.to_string()).collect())
    }
}

impl From<FeatureSet> for Document {
    fn from(features: FeatureSet) -> Self {
        Document::Features(features.into_vec())
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Document::Keyed(map)
    }
}

impl TryFrom<Value> for Document {
    type Error = BayesianError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(text) => Ok(Document::Text(text)),
            Value::Object(map) => Ok(Document::Keyed(map)),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    Value::Number(n) => Ok(n.to_string()),
                    Value::Bool(b) => Ok(b.to_string()),
                    other => Err(BayesianError::invalid_document(format!(
                        "feature list contains {}",
                        describe(&other)
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(Document::Features),
            other => Err(BayesianError::invalid_document(describe(&other))),
        }
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        match document {
            Document::Text(text) => Value::String(text),
            Document::Features(features) => {
                Value::Array(features.into_iter().map(Value::String).collect())
            }
            Document::Keyed(map) => Value::Object(map),
        }
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(_) => "string".to_string(),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}

/// Normalizes documents into feature sets.
///
/// Extraction is pure: the same document always yields the same features in
/// the same order. Tokenization is case-sensitive and does no stemming.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    tokenizer: Arc<dyn Tokenizer>,
}

impl FeatureExtractor {
    /// Create an extractor splitting text on runs of non-word characters.
    pub fn new() -> Self {
        Self::with_tokenizer(Arc::new(RegexTokenizer::default()))
    }

    /// Create an extractor with a custom tokenizer for text documents.
    pub fn with_tokenizer(tokenizer: Arc<dyn Tokenizer>) -> Self {
        FeatureExtractor { tokenizer }
    }

    pub fn tokenizer(&self) -> &Arc<dyn Tokenizer> {
        &self.tokenizer
    }

    /// Extract the unique features of a document.
    pub fn extract(&self, document: &Document) -> Result<FeatureSet> {
        match document {
            Document::Text(text) => Ok(self
                .tokenizer
                .tokenize(text)?
                .filter(|token| !token.is_empty())
                .map(|token| token.text)
                .collect()),
            Document::Features(features) => Ok(features.iter().cloned().collect()),
            Document::Keyed(map) => Ok(map.keys().cloned().collect()),
        }
    }

    /// Extract features from an untyped JSON value.
    ///
    /// Fails with [`BayesianError::InvalidDocumentType`] when the value is not a
    /// string, a list of scalars, or an object.
    pub fn extract_value(&self, value: Value) -> Result<FeatureSet> {
        self.extract(&Document::try_from(value)?)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}
