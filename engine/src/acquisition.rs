//! Quote acquisition across all configured sources.
//!
//! Each configured `(source, endpoint)` pair is resolved against the
//! registry and queried under its own timeout, at most
//! `max_concurrent_sources` at a time. A source that is unknown, fails,
//! times out or reports a non-positive price is logged and left out. The
//! batch itself never fails, and an empty result is valid.

use futures::stream::{self, StreamExt};
use hbar_rate_common::Quote;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::AcquisitionConfig;
use crate::error::{SourceError, SourceResult};
use crate::source::SourceRegistry;

/// What happened to one configured source during a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOutcome {
    pub source: String,
    pub endpoint: String,
    pub result: SourceResult<Quote>,
}

impl SourceOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Result of one acquisition batch.
#[derive(Debug, Clone)]
pub struct AcquisitionReport {
    /// Tags every log line of the batch.
    pub cycle_id: Uuid,
    /// One entry per configured source, in configuration order.
    pub outcomes: Vec<SourceOutcome>,
}

impl AcquisitionReport {
    /// Accepted quotes, in configuration order.
    pub fn quotes(&self) -> Vec<Quote> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().ok().cloned())
            .collect()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Queries configured sources through the registry.
#[derive(Debug, Clone)]
pub struct QuoteAcquirer {
    registry: Arc<SourceRegistry>,
    source_timeout: Duration,
    max_concurrent: usize,
}

impl QuoteAcquirer {
    /// Create a new acquirer.
    pub fn new(registry: Arc<SourceRegistry>, config: &AcquisitionConfig) -> Self {
        Self {
            registry,
            source_timeout: config.source_timeout,
            max_concurrent: config.max_concurrent_sources.max(1),
        }
    }

    /// Query every source in `endpoints` and wait for all of them.
    pub async fn acquire(&self, endpoints: &BTreeMap<String, String>) -> AcquisitionReport {
        let cycle_id = Uuid::now_v7();
        let configured: Vec<(String, String)> = endpoints
            .iter()
            .map(|(source, endpoint)| (source.clone(), endpoint.clone()))
            .collect();

        let outcomes: Vec<SourceOutcome> = stream::iter(configured)
            .map(|(source, endpoint)| async move {
                self.attempt(cycle_id, &source, &endpoint).await
            })
            .buffered(self.max_concurrent)
            .collect()
            .await;

        AcquisitionReport { cycle_id, outcomes }
    }

    async fn attempt(&self, cycle_id: Uuid, source: &str, endpoint: &str) -> SourceOutcome {
        let result = self.fetch(source, endpoint).await;

        match &result {
            Ok(quote) => debug!(
                cycle_id = %cycle_id,
                source,
                price = %quote.price,
                "Got quote from source"
            ),
            Err(e) => warn!(
                cycle_id = %cycle_id,
                source,
                endpoint,
                error = %e,
                retryable = e.is_retryable(),
                "Skipping quote source"
            ),
        }

        SourceOutcome {
            source: source.to_string(),
            endpoint: endpoint.to_string(),
            result,
        }
    }

    async fn fetch(&self, source: &str, endpoint: &str) -> SourceResult<Quote> {
        let adapter = self.registry.get(source).ok_or(SourceError::UnknownSource)?;

        let price = tokio::time::timeout(self.source_timeout, adapter.quote(endpoint))
            .await
            .map_err(|_| SourceError::Timeout(self.source_timeout))??;

        if price.is_sign_negative() || price.is_zero() {
            return Err(SourceError::InvalidPrice(price));
        }

        Ok(Quote::new(source, price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{MockQuoteSource, QuoteSource};
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn acquirer(registry: SourceRegistry, timeout: Duration) -> QuoteAcquirer {
        let config = AcquisitionConfig {
            source_timeout: timeout,
            ..Default::default()
        };
        QuoteAcquirer::new(Arc::new(registry), &config)
    }

    fn endpoints(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(s, e)| (s.to_string(), e.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_collects_successes_and_skips_failures() {
        let binance = Arc::new(MockQuoteSource::new("binance"));
        binance.set_price("b", dec!(0.041));
        let coinbase = Arc::new(MockQuoteSource::new("coinbase"));
        coinbase.set_failure("c", SourceError::Malformed("missing field".into()));
        let okcoin = Arc::new(MockQuoteSource::new("okcoin"));
        okcoin.set_price("o", dec!(0.043));

        let registry = SourceRegistry::new()
            .with_source(binance)
            .with_source(coinbase)
            .with_source(okcoin);
        let report = acquirer(registry, Duration::from_secs(1))
            .acquire(&endpoints(&[
                ("binance", "b"),
                ("coinbase", "c"),
                ("liquid", "l"),
                ("okcoin", "o"),
            ]))
            .await;

        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 2);
        assert_eq!(
            report.quotes(),
            vec![
                Quote::new("binance", dec!(0.041)),
                Quote::new("okcoin", dec!(0.043))
            ]
        );
        assert_eq!(report.outcomes[2].source, "liquid");
        assert_eq!(report.outcomes[2].result, Err(SourceError::UnknownSource));
    }

    #[tokio::test]
    async fn test_rejects_non_positive_price() {
        let upbit = Arc::new(MockQuoteSource::new("upbit"));
        upbit.set_price("u", Decimal::ZERO);

        let report = acquirer(SourceRegistry::new().with_source(upbit), Duration::from_secs(1))
            .acquire(&endpoints(&[("upbit", "u")]))
            .await;

        assert!(report.quotes().is_empty());
        assert_eq!(
            report.outcomes[0].result,
            Err(SourceError::InvalidPrice(Decimal::ZERO))
        );
    }

    #[tokio::test]
    async fn test_slow_source_times_out() {
        let slow = Arc::new(MockQuoteSource::new("bitrex"));
        slow.set_price("x", dec!(0.05));
        slow.set_delay(Duration::from_millis(200));
        let fast = Arc::new(MockQuoteSource::new("binance"));
        fast.set_price("b", dec!(0.04));

        let registry = SourceRegistry::new().with_source(slow).with_source(fast);
        let report = acquirer(registry, Duration::from_millis(20))
            .acquire(&endpoints(&[("bitrex", "x"), ("binance", "b")]))
            .await;

        assert_eq!(report.quotes(), vec![Quote::new("binance", dec!(0.04))]);
        let bitrex = report.outcomes.iter().find(|o| o.source == "bitrex").unwrap();
        assert_eq!(
            bitrex.result,
            Err(SourceError::Timeout(Duration::from_millis(20)))
        );
    }

    /// Source that records how many requests overlap across all instances.
    struct CountingSource {
        name: String,
        in_flight: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl QuoteSource for CountingSource {
        fn name(&self) -> &str {
            &self.name
        }

        async fn quote(&self, _endpoint: &str) -> SourceResult<Decimal> {
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(running, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(dec!(0.05))
        }
    }

    #[tokio::test]
    async fn test_fan_out_respects_concurrency_limit() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut registry = SourceRegistry::new();
        let mut configured = BTreeMap::new();
        for i in 0..8 {
            let name = format!("exchange-{i}");
            registry.register(Arc::new(CountingSource {
                name: name.clone(),
                in_flight: in_flight.clone(),
                peak: peak.clone(),
            }));
            configured.insert(name, "endpoint".to_string());
        }

        let config = AcquisitionConfig {
            source_timeout: Duration::from_secs(1),
            max_concurrent_sources: 2,
            ..Default::default()
        };
        let report = QuoteAcquirer::new(Arc::new(registry), &config)
            .acquire(&configured)
            .await;

        assert_eq!(report.succeeded(), 8);
        assert_eq!(peak.load(Ordering::SeqCst), 2);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_configuration() {
        let report = acquirer(SourceRegistry::new(), Duration::from_secs(1))
            .acquire(&BTreeMap::new())
            .await;

        assert!(report.outcomes.is_empty());
        assert!(report.quotes().is_empty());
    }

    proptest! {
        #[test]
        fn prop_batch_always_completes(flags in prop::collection::vec(any::<bool>(), 0..8)) {
            let mut registry = SourceRegistry::new();
            let mut configured = BTreeMap::new();
            for (i, healthy) in flags.iter().enumerate() {
                let name = format!("source-{i}");
                let source = MockQuoteSource::new(name.clone());
                if *healthy {
                    source.set_price("endpoint", Decimal::new(400 + i as i64, 4));
                }
                registry.register(Arc::new(source));
                configured.insert(name, "endpoint".to_string());
            }

            let report = tokio_test::block_on(
                acquirer(registry, Duration::from_secs(1)).acquire(&configured),
            );

            prop_assert_eq!(report.outcomes.len(), flags.len());
            prop_assert_eq!(report.succeeded(), flags.iter().filter(|h| **h).count());
        }
    }
}
