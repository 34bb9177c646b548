//! Error types for the Bayesian classifier.
//!
//! All fallible operations in this crate return [`BayesianError`] through the
//! [`Result`] alias. Storage failures of any kind are funnelled into
//! [`BayesianError::Backend`] so callers can tell them apart from bad input.
//!
//! # Examples
//!
//! ```
//! use bayesian::error::{BayesianError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(BayesianError::invalid_config("weight must be positive"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for classifier operations.
#[derive(Error, Debug)]
pub enum BayesianError {
    /// I/O errors outside a storage backend (reading training files, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A value could not be interpreted as a document.
    #[error("Invalid document type: {0}")]
    InvalidDocumentType(String),

    /// Any failure surfaced by a storage backend.
    #[error("Backend failure: {0}")]
    Backend(String),

    /// Configuration values out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Operation not supported in the current state, e.g. a synchronous call on an
    /// asynchronous backend.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Analysis-related errors (tokenizer construction).
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for operations that may fail with BayesianError.
pub type Result<T> = std::result::Result<T, BayesianError>;

impl BayesianError {
    /// Create a new invalid document type error.
    pub fn invalid_document<S: Into<String>>(msg: S) -> Self {
        BayesianError::InvalidDocumentType(msg.into())
    }

    /// Create a new backend failure.
    pub fn backend<S: Into<String>>(msg: S) -> Self {
        BayesianError::Backend(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        BayesianError::InvalidConfig(msg.into())
    }

    /// Create a new invalid operation error.
    pub fn invalid_operation<S: Into<String>>(msg: S) -> Self {
        BayesianError::InvalidOperation(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        BayesianError::Analysis(msg.into())
    }

    /// Whether this error originated in the storage layer.
    pub fn is_backend_failure(&self) -> bool {
        matches!(self, BayesianError::Backend(_))
    }
}
