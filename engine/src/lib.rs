//! HBAR Rate Engine
//!
//! Computes the periodically published HBAR to cent exchange rate from
//! independent price sources.
//!
//! # Features
//!
//! - Bounded concurrent quote acquisition with per-source timeouts
//! - Median aggregation that tolerates any number of failed sources
//! - Clipping against the last midnight rate and a configured price floor
//! - Carry-forward of the current rate when no source answers
//!
//! # Example
//!
//! ```rust,ignore
//! use hbar_rate_engine::{EngineConfig, RateEngine, ReferenceRates, SourceRegistry};
//!
//! let registry = SourceRegistry::new().with_source(Arc::new(my_exchange));
//! let config = EngineConfig::from_env();
//! let engine = RateEngine::new(Arc::new(registry), config.clone())?;
//!
//! let references = ReferenceRates::resolve(latest.as_ref(), midnight.as_ref(), config.default_rate(0)?);
//! let exchange_rate = engine.compute(&references).await?;
//! let audit = engine.quotes_json()?;
//! ```

pub mod acquisition;
pub mod config;
pub mod engine;
pub mod error;
pub mod median;
pub mod policy;
pub mod source;

pub use acquisition::{AcquisitionReport, QuoteAcquirer, SourceOutcome};
pub use config::{AcquisitionConfig, EngineConfig, RateParameters};
pub use engine::{RateEngine, ReferenceRates};
pub use error::{EngineError, EngineResult, SourceError, SourceResult};
pub use median::median;
pub use policy::StabilizationPolicy;
pub use source::{QuoteSource, SourceRegistry};

#[cfg(any(test, feature = "test-utils"))]
pub use source::MockQuoteSource;
