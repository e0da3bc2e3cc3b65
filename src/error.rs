//! Error types for capture analysis.
//!
//! All fallible operations in this crate return [`AnalysisError`]. The taxonomy is
//! deliberately small:
//!
//! - **Length errors**: a fixed-size header or record was sliced from the wrong region
//! - **Chain errors**: a logical packet chain declares more bytes than remain
//! - **Input errors**: a raw capture record or configuration is missing or mangles a field
//!
//! Unknown packet types and attributes are not errors; they decode to explicit
//! `Unknown` variants so captures of newer firmware stay readable.
//!
//! ```rust
//! use km003c_analysis::{AnalysisError, decode_ctrl_header};
//!
//! let err = decode_ctrl_header(&[0x0C, 0x0A]).unwrap_err();
//! assert!(matches!(err, AnalysisError::TooShort { needed: 4, actual: 2, .. }));
//! assert!(!err.is_recoverable());
//! ```

use thiserror::Error;

/// Result type alias for analysis operations.
pub type Result<T, E = AnalysisError> = std::result::Result<T, E>;

/// Main error type for decoding and transaction analysis.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnalysisError {
    #[error("{context} too short: need {needed} bytes, have {actual}")]
    TooShort { context: &'static str, needed: usize, actual: usize },

    #[error(
        "Malformed logical packet chain at offset {offset}: declared {declared} bytes, {remaining} remaining"
    )]
    MalformedChain { offset: usize, declared: usize, remaining: usize },

    #[error("Required field '{field}' missing from capture record")]
    MissingField { field: &'static str },

    #[error("Field '{field}' has uninterpretable value '{value}'")]
    InvalidField { field: &'static str, value: String },

    #[error("Configuration error: {details}")]
    Config { details: String },
}

impl AnalysisError {
    /// Returns whether a caller can keep the partial result and move on.
    ///
    /// Only chain errors qualify: everything decoded before the bad record is still valid.
    pub fn is_recoverable(&self) -> bool {
        match self {
            AnalysisError::MalformedChain { .. } => true,
            AnalysisError::TooShort { .. } => false,
            AnalysisError::MissingField { .. } => false,
            AnalysisError::InvalidField { .. } => false,
            AnalysisError::Config { .. } => false,
        }
    }

    /// Helper constructor for length errors.
    pub fn too_short(context: &'static str, needed: usize, actual: usize) -> Self {
        AnalysisError::TooShort { context, needed, actual }
    }

    /// Helper constructor for missing record fields.
    pub fn missing_field(field: &'static str) -> Self {
        AnalysisError::MissingField { field }
    }

    /// Helper constructor for record fields that cannot be interpreted.
    pub fn invalid_field(field: &'static str, value: impl Into<String>) -> Self {
        AnalysisError::InvalidField { field, value: value.into() }
    }
}

impl From<serde_yaml_ng::Error> for AnalysisError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        AnalysisError::Config { details: err.to_string() }
    }
}
