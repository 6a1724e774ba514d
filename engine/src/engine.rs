//! Main rate engine implementation.

use std::sync::Arc;

use hbar_rate_common::{
    next_hour_boundary, now, ExchangeRate, Quote, Rate, RateError, RateResult, Timestamp,
};
use parking_lot::RwLock;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use crate::acquisition::QuoteAcquirer;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::median::median;
use crate::policy::StabilizationPolicy;
use crate::source::SourceRegistry;

/// Rates the caller carries between cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceRates {
    /// The rate currently in force.
    pub current: Rate,
    /// The rate accepted at the last day boundary, if any.
    pub midnight: Option<Rate>,
}

impl ReferenceRates {
    pub fn new(current: Rate, midnight: Option<Rate>) -> Self {
        Self { current, midnight }
    }

    /// Pick reference rates from stored history.
    ///
    /// The current rate is the next rate of the latest published pair, or
    /// `default_rate` when nothing was published. The midnight anchor is the
    /// next rate of the latest pair that expired at midnight.
    pub fn resolve(
        latest: Option<&ExchangeRate>,
        latest_midnight: Option<&ExchangeRate>,
        default_rate: Rate,
    ) -> Self {
        let current = match latest {
            Some(exchange_rate) => {
                debug!("Using latest exchange rate as current rate");
                *exchange_rate.next_rate()
            }
            None => {
                info!("No published exchange rate, using default rate as current rate");
                default_rate
            }
        };

        Self {
            current,
            midnight: latest_midnight.map(|exchange_rate| *exchange_rate.next_rate()),
        }
    }
}

/// Computes the `(current, next)` exchange rate pair for one cycle.
pub struct RateEngine {
    config: EngineConfig,
    acquirer: QuoteAcquirer,
    policy: StabilizationPolicy,
    last_quotes: RwLock<Vec<Quote>>,
}

impl RateEngine {
    /// Create a new engine. Fails on an inconsistent configuration.
    pub fn new(registry: Arc<SourceRegistry>, config: EngineConfig) -> EngineResult<Self> {
        config.validate().map_err(EngineError::Configuration)?;

        for name in config.acquisition.endpoints.keys() {
            if !registry.contains(name) {
                warn!(source = %name, "Configured source has no registered adapter");
            }
        }

        Ok(Self {
            acquirer: QuoteAcquirer::new(registry, &config.acquisition),
            policy: StabilizationPolicy::new(config.rate.bound, config.rate.floor_cents),
            config,
            last_quotes: RwLock::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one cycle against the wall clock.
    pub async fn compute(&self, references: &ReferenceRates) -> EngineResult<ExchangeRate> {
        self.compute_at(references, now()).await
    }

    /// Run one cycle as if the clock read `at`.
    ///
    /// The current rate expires at the first whole hour after `at`; the next
    /// rate expires one frequency later.
    #[instrument(skip(self, references), fields(sources = self.config.acquisition.endpoints.len()))]
    pub async fn compute_at(
        &self,
        references: &ReferenceRates,
        at: Timestamp,
    ) -> EngineResult<ExchangeRate> {
        let report = self
            .acquirer
            .acquire(&self.config.acquisition.endpoints)
            .await;
        let quotes = report.quotes();
        *self.last_quotes.write() = quotes.clone();

        info!(
            cycle_id = %report.cycle_id,
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Quote acquisition finished"
        );

        let exchange_rate = self.derive(&quotes, references, next_hour_boundary(at))?;

        info!(
            cycle_id = %report.cycle_id,
            current_expiration = exchange_rate.current_expiration_time_seconds(),
            next_expiration = exchange_rate.next_expiration_time_seconds(),
            cent_equivalent = exchange_rate.next_rate().cent_equivalent(),
            midnight = exchange_rate.is_midnight_time(),
            "Exchange rate computed"
        );

        Ok(exchange_rate)
    }

    /// Turn acquired quotes into the rate pair. Performs no I/O.
    pub fn derive(
        &self,
        quotes: &[Quote],
        references: &ReferenceRates,
        current_expiration: i64,
    ) -> EngineResult<ExchangeRate> {
        let current = references.current.with_expiration(current_expiration);
        let next_expiration = current_expiration
            .checked_add(self.config.rate.frequency_seconds)
            .ok_or(RateError::Overflow("next expiration"))?;

        let next = match median(quotes.iter().map(|quote| quote.price)) {
            None => {
                warn!(
                    current = %current,
                    "No median computed, carrying the current rate forward"
                );
                current.with_expiration(next_expiration)
            }
            Some(median) => {
                debug!(median = %median, quotes = quotes.len(), "Median calculated");
                let candidate = self.candidate(median, next_expiration)?;
                self.policy.apply(references.midnight.as_ref(), candidate)?
            }
        };

        Ok(ExchangeRate::new(current, next)?)
    }

    /// Quotes accepted in the most recent cycle, in configuration order.
    pub fn last_acquired_quotes(&self) -> Vec<Quote> {
        self.last_quotes.read().clone()
    }

    /// [`last_acquired_quotes`](Self::last_acquired_quotes) as a JSON array
    /// of `{"source", "price"}` records.
    pub fn quotes_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string(&*self.last_quotes.read())?)
    }

    /// Rate worth `median` per HBAR. The cent equivalent is truncated.
    fn candidate(&self, median: Decimal, next_expiration: i64) -> RateResult<Rate> {
        let hbar_equivalent = self.config.rate.hbar_equivalent;
        let cents = median
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.checked_mul(Decimal::from(hbar_equivalent)))
            .and_then(|cents| cents.trunc().to_i64())
            .ok_or(RateError::Overflow("candidate cent equivalent"))?;

        Rate::new(hbar_equivalent, cents, next_expiration)
    }
}
