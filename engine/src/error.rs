//! Rate engine error types.

use hbar_rate_common::RateError;
use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;

/// Why a single quote source produced no usable price.
///
/// These never escape quote acquisition; the source is logged and left out
/// of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// No adapter is registered under the configured name.
    #[error("No adapter registered for source")]
    UnknownSource,

    /// The adapter answered but had no price to report.
    #[error("Source returned no data")]
    NoData,

    /// The response could not be decoded.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Transport-level failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Zero or negative price.
    #[error("Invalid price {0}")]
    InvalidPrice(Decimal),

    /// The adapter did not answer within the per-source timeout.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl SourceError {
    /// Check if this failure is likely transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SourceError::Network(_) | SourceError::Timeout(_))
    }
}

/// Result type returned by quote source adapters.
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors that fail a whole rate computation cycle.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine was configured with inconsistent parameters.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A rate invariant was violated while computing the cycle.
    #[error("Rate computation failed: {0}")]
    Computation(#[from] RateError),

    /// Diagnostic output could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
