//! Quote source adapters and the registry that names them.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::SourceResult;

/// Trait for exchange price adapters.
///
/// An adapter fetches and decodes one current HBAR price from the endpoint
/// it is given. Every failure is reported as a [`SourceError`] value.
///
/// [`SourceError`]: crate::error::SourceError
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Get the name the adapter is registered under.
    fn name(&self) -> &str;

    /// Fetch the current price from `endpoint`.
    async fn quote(&self, endpoint: &str) -> SourceResult<Decimal>;
}

/// Adapters available to the engine, keyed by source name.
///
/// Built once at startup and handed to the acquirer; it is not mutated
/// while a cycle runs.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: HashMap<String, Arc<dyn QuoteSource>>,
}

impl SourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own name, replacing any previous one.
    pub fn register(&mut self, source: Arc<dyn QuoteSource>) {
        self.sources.insert(source.name().to_string(), source);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_source(mut self, source: Arc<dyn QuoteSource>) -> Self {
        self.register(source);
        self
    }

    /// Look up an adapter by source name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn QuoteSource>> {
        self.sources.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    /// Registered source names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sources.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("sources", &self.names())
            .finish()
    }
}

/// Mock quote source for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockQuoteSource {
    name: String,
    responses: dashmap::DashMap<String, SourceResult<Decimal>>,
    delay: parking_lot::RwLock<Option<std::time::Duration>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockQuoteSource {
    /// Create a new mock source.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            responses: dashmap::DashMap::new(),
            delay: parking_lot::RwLock::new(None),
        }
    }

    /// Answer `endpoint` with `price`.
    pub fn set_price(&self, endpoint: impl Into<String>, price: Decimal) {
        self.responses.insert(endpoint.into(), Ok(price));
    }

    /// Answer `endpoint` with `error`.
    pub fn set_failure(&self, endpoint: impl Into<String>, error: crate::error::SourceError) {
        self.responses.insert(endpoint.into(), Err(error));
    }

    /// Sleep before answering every request.
    pub fn set_delay(&self, delay: std::time::Duration) {
        *self.delay.write() = Some(delay);
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl QuoteSource for MockQuoteSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn quote(&self, endpoint: &str) -> SourceResult<Decimal> {
        let delay = *self.delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.responses
            .get(endpoint)
            .map(|r| r.value().clone())
            .unwrap_or(Err(crate::error::SourceError::NoData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_mock_source() {
        let source = MockQuoteSource::new("coinbase");
        source.set_price("https://api.coinbase.test", dec!(0.0412));
        source.set_failure("https://down.test", SourceError::Network("refused".into()));

        assert_eq!(source.quote("https://api.coinbase.test").await, Ok(dec!(0.0412)));
        assert!(matches!(
            source.quote("https://down.test").await,
            Err(SourceError::Network(_))
        ));
        assert_eq!(source.quote("https://other.test").await, Err(SourceError::NoData));
    }

    #[test]
    fn test_registry_lookup() {
        let registry = SourceRegistry::new()
            .with_source(Arc::new(MockQuoteSource::new("okcoin")))
            .with_source(Arc::new(MockQuoteSource::new("binance")));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("okcoin"));
        assert!(registry.get("bitrex").is_none());
        assert_eq!(registry.names(), vec!["binance", "okcoin"]);
        assert_eq!(registry.get("binance").unwrap().name(), "binance");
    }

    #[test]
    fn test_registry_replaces_same_name() {
        let mut registry = SourceRegistry::new();
        registry.register(Arc::new(MockQuoteSource::new("upbit")));
        registry.register(Arc::new(MockQuoteSource::new("upbit")));

        assert_eq!(registry.len(), 1);
    }
}
