//! Unified error handling for the CostLens library
//!
//! Only three situations are fatal to a caller: invalid configuration at the
//! entry point, money totals beyond the decimal range, and direct requests
//! that cannot produce any output at all (such as statistics over an empty
//! series). Missing or unparseable billing data is
//! reported through omission counters instead, see
//! [`crate::analytics::normalizer::OmissionReport`].

use std::io;
use thiserror::Error;

use crate::config::ConfigError;

/// The main error type for the CostLens library
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CostLensError {
    /// A configuration value was rejected at the call boundary
    #[error("Invalid configuration for '{parameter}': {value}\n{hint}")]
    InvalidConfiguration {
        /// Name of the offending parameter
        parameter: String,
        /// The value that was supplied
        value: String,
        /// How to fix it
        hint: String,
    },

    /// The input series is too short to produce any result
    #[error("Insufficient data: need at least {required} points, got {actual}")]
    InsufficientData {
        /// Minimum number of points required
        required: usize,
        /// Number of points supplied
        actual: usize,
    },

    /// A total or projection grew beyond the representable decimal range
    #[error("Arithmetic overflow while computing {operation}")]
    Overflow {
        /// What was being computed
        operation: String,
    },

    /// A service canonicalization rule could not be compiled
    #[error("Invalid canonicalization rule '{pattern}': {source}")]
    InvalidRule {
        /// The pattern that failed to compile
        pattern: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },

    /// Configuration loading failed
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// CSV export error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl CostLensError {
    /// Build an [`CostLensError::InvalidConfiguration`] error
    pub fn invalid_config(
        parameter: impl Into<String>,
        value: impl ToString,
        hint: impl Into<String>,
    ) -> Self {
        Self::InvalidConfiguration {
            parameter: parameter.into(),
            value: value.to_string(),
            hint: hint.into(),
        }
    }

    /// Build an [`CostLensError::Overflow`] error
    pub fn overflow(operation: impl Into<String>) -> Self {
        Self::Overflow {
            operation: operation.into(),
        }
    }

    /// Whether this error was caused by the caller's configuration
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfiguration { .. } | Self::InvalidRule { .. } | Self::Config(_)
        )
    }
}

/// Result type alias for CostLens operations
pub type Result<T> = std::result::Result<T, CostLensError>;
