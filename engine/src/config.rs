//! Rate engine configuration.

use hbar_rate_common::{Rate, RateResult};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::time::Duration;

/// Parameters of the rate computation itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateParameters {
    /// HBAR side of every computed rate.
    pub hbar_equivalent: i64,
    /// Largest relative move per cycle away from the midnight anchor.
    pub bound: Decimal,
    /// Minimum cents per one HBAR.
    pub floor_cents: Decimal,
    /// Length of one rate cycle.
    pub frequency_seconds: i64,
    /// Cent side of the rate used when no rate has been published yet.
    pub default_cent_equivalent: i64,
}

impl Default for RateParameters {
    fn default() -> Self {
        Self {
            hbar_equivalent: 30_000,
            bound: Decimal::new(25, 2),
            floor_cents: Decimal::new(5, 1),
            frequency_seconds: 3_600,
            default_cent_equivalent: 120_000,
        }
    }
}

/// Quote acquisition configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionConfig {
    /// Endpoint per source name.
    pub endpoints: BTreeMap<String, String>,
    /// Time allowed for one source to answer.
    pub source_timeout: Duration,
    /// Sources queried at the same time.
    pub max_concurrent_sources: usize,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            endpoints: BTreeMap::new(),
            source_timeout: Duration::from_secs(10),
            max_concurrent_sources: 4,
        }
    }
}

/// Main engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Rate computation parameters.
    pub rate: RateParameters,
    /// Quote acquisition configuration.
    pub acquisition: AcquisitionConfig,
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(hbar) = env_parse("ERT_HBAR_EQUIVALENT") {
            config.rate.hbar_equivalent = hbar;
        }

        if let Some(bound) = env_parse("ERT_BOUND") {
            config.rate.bound = bound;
        }

        if let Some(floor) = env_parse("ERT_FLOOR_CENTS") {
            config.rate.floor_cents = floor;
        }

        if let Some(frequency) = env_parse("ERT_FREQUENCY_SECONDS") {
            config.rate.frequency_seconds = frequency;
        }

        if let Some(cents) = env_parse("ERT_DEFAULT_CENT_EQUIVALENT") {
            config.rate.default_cent_equivalent = cents;
        }

        if let Some(millis) = env_parse("ERT_SOURCE_TIMEOUT_MS") {
            config.acquisition.source_timeout = Duration::from_millis(millis);
        }

        if let Some(max) = env_parse("ERT_MAX_CONCURRENT_SOURCES") {
            config.acquisition.max_concurrent_sources = max;
        }

        if let Ok(sources) = std::env::var("ERT_SOURCES") {
            config.acquisition.endpoints = parse_endpoints(&sources);
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        let rate = &self.rate;

        if rate.hbar_equivalent <= 0 {
            return Err("HBAR equivalent must be positive".to_string());
        }

        if rate.frequency_seconds <= 0 {
            return Err("Frequency must be positive".to_string());
        }

        if rate.bound < Decimal::ZERO || rate.bound >= Decimal::ONE {
            return Err(format!("Bound {} must be within [0, 1)", rate.bound));
        }

        if rate.floor_cents < Decimal::ZERO {
            return Err("Floor cannot be negative".to_string());
        }

        if rate.default_cent_equivalent < 0 {
            return Err("Default cent equivalent cannot be negative".to_string());
        }

        if self.acquisition.max_concurrent_sources == 0 {
            return Err("At least one source must be queried at a time".to_string());
        }

        if self.acquisition.source_timeout.is_zero() {
            return Err("Source timeout cannot be 0".to_string());
        }

        Ok(())
    }

    /// The configured fallback rate, expiring at `expiration_time_seconds`.
    pub fn default_rate(&self, expiration_time_seconds: i64) -> RateResult<Rate> {
        Rate::new(
            self.rate.hbar_equivalent,
            self.rate.default_cent_equivalent,
            expiration_time_seconds,
        )
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|value| value.trim().parse().ok())
}

/// Parse `name=endpoint` pairs separated by commas. Malformed pairs are
/// dropped.
fn parse_endpoints(raw: &str) -> BTreeMap<String, String> {
    raw.split(',')
        .filter_map(|pair| {
            let (name, endpoint) = pair.split_once('=')?;
            let (name, endpoint) = (name.trim(), endpoint.trim());
            if name.is_empty() || endpoint.is_empty() {
                return None;
            }
            Some((name.to_string(), endpoint.to_string()))
        })
        .collect()
}
