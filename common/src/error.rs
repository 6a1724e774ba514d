//! Error types for rate construction and arithmetic.

use thiserror::Error;

/// Invariant violations raised while building or transforming rates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateError {
    /// The HBAR side of a rate must be positive.
    #[error("HBAR equivalent must be positive, got {0}")]
    NonPositiveHbarEquivalent(i64),

    /// The cent side of a rate cannot be negative.
    #[error("Cent equivalent cannot be negative, got {0}")]
    NegativeCentEquivalent(i64),

    /// The next rate must expire after the current one.
    #[error("Next rate expires at {next}, not after current expiration {current}")]
    ExpirationOrder { current: i64, next: i64 },

    /// Decimal or integer arithmetic left the representable range.
    #[error("Arithmetic overflow computing {0}")]
    Overflow(&'static str),
}

/// Result type alias for rate operations.
pub type RateResult<T> = std::result::Result<T, RateError>;
