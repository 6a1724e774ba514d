//! Exchange rate value types.
//!
//! A [`Rate`] states that `hbar_equivalent` HBAR are worth `cent_equivalent`
//! cents until `expiration_time_seconds`. An [`ExchangeRate`] pairs the rate
//! currently in force with the one that replaces it.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{RateError, RateResult};
use crate::time::is_day_boundary;

const CENTS_PER_UNIT: i64 = 100;

/// An immutable HBAR to cent ratio with an expiration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RateRecord", rename_all = "camelCase")]
pub struct Rate {
    hbar_equivalent: i64,
    cent_equivalent: i64,
    expiration_time_seconds: i64,
}

/// Unvalidated wire form of a [`Rate`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RateRecord {
    hbar_equivalent: i64,
    cent_equivalent: i64,
    expiration_time_seconds: i64,
}

impl TryFrom<RateRecord> for Rate {
    type Error = RateError;

    fn try_from(record: RateRecord) -> RateResult<Self> {
        Rate::new(
            record.hbar_equivalent,
            record.cent_equivalent,
            record.expiration_time_seconds,
        )
    }
}

impl Rate {
    /// Create a new rate, rejecting a non-positive HBAR equivalent or a
    /// negative cent equivalent.
    pub fn new(
        hbar_equivalent: i64,
        cent_equivalent: i64,
        expiration_time_seconds: i64,
    ) -> RateResult<Self> {
        if hbar_equivalent <= 0 {
            return Err(RateError::NonPositiveHbarEquivalent(hbar_equivalent));
        }
        if cent_equivalent < 0 {
            return Err(RateError::NegativeCentEquivalent(cent_equivalent));
        }

        Ok(Self {
            hbar_equivalent,
            cent_equivalent,
            expiration_time_seconds,
        })
    }

    pub fn hbar_equivalent(&self) -> i64 {
        self.hbar_equivalent
    }

    pub fn cent_equivalent(&self) -> i64 {
        self.cent_equivalent
    }

    pub fn expiration_time_seconds(&self) -> i64 {
        self.expiration_time_seconds
    }

    /// The same ratio with a different expiration time.
    pub fn with_expiration(&self, expiration_time_seconds: i64) -> Self {
        Self {
            expiration_time_seconds,
            ..*self
        }
    }

    /// Price of one HBAR in fiat units: `cent / (100 * hbar)`.
    pub fn unit_price(&self) -> Decimal {
        Decimal::from(self.cent_equivalent)
            / (Decimal::from(self.hbar_equivalent) * Decimal::from(CENTS_PER_UNIT))
    }

    /// Whether `candidate` moved by at most `bound` relative to this rate.
    ///
    /// The relative difference is always measured against `self`, never the
    /// candidate. Both prices are compared as cross products so no rounding
    /// happens before the comparison:
    /// `|c.cent * r.hbar - r.cent * c.hbar| <= bound * r.cent * c.hbar`.
    ///
    /// A zero-priced reference only admits a zero-priced candidate.
    pub fn is_small_change(&self, bound: Decimal, candidate: &Rate) -> RateResult<bool> {
        if self.cent_equivalent == 0 {
            return Ok(candidate.cent_equivalent == 0);
        }

        let movement = cross(candidate.cent_equivalent, self.hbar_equivalent)?
            .checked_sub(cross(self.cent_equivalent, candidate.hbar_equivalent)?)
            .ok_or(RateError::Overflow("rate movement"))?
            .abs();
        let allowance = bound
            .checked_mul(cross(self.cent_equivalent, candidate.hbar_equivalent)?)
            .ok_or(RateError::Overflow("bound allowance"))?;

        Ok(movement <= allowance)
    }

    /// Pull `candidate` back to exactly `bound` away from this rate, in the
    /// direction the candidate moved.
    ///
    /// The candidate's HBAR equivalent and expiration are kept. A candidate
    /// already within bound is returned unchanged. The resulting cent
    /// equivalent is truncated toward zero.
    pub fn clip_rate(&self, candidate: &Rate, bound: Decimal) -> RateResult<Rate> {
        if self.is_small_change(bound, candidate)? {
            return Ok(*candidate);
        }

        let rising = cross(candidate.cent_equivalent, self.hbar_equivalent)?
            > cross(self.cent_equivalent, candidate.hbar_equivalent)?;
        let factor = if rising {
            Decimal::ONE + bound
        } else {
            Decimal::ONE - bound
        };

        let cents = cross(self.cent_equivalent, candidate.hbar_equivalent)?
            .checked_mul(factor)
            .and_then(|scaled| scaled.checked_div(Decimal::from(self.hbar_equivalent)))
            .ok_or(RateError::Overflow("clipped cent equivalent"))?;
        let cents = cents
            .trunc()
            .to_i64()
            .ok_or(RateError::Overflow("clipped cent equivalent"))?;

        Rate::new(
            candidate.hbar_equivalent,
            cents.max(0),
            candidate.expiration_time_seconds,
        )
    }
}

fn cross(cents: i64, hbars: i64) -> RateResult<Decimal> {
    Decimal::from(cents)
        .checked_mul(Decimal::from(hbars))
        .ok_or(RateError::Overflow("rate cross product"))
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hbar = {} cents (expires {})",
            self.hbar_equivalent, self.cent_equivalent, self.expiration_time_seconds
        )
    }
}

/// The rate in force and the rate that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ExchangeRateRecord", rename_all = "camelCase")]
pub struct ExchangeRate {
    current_rate: Rate,
    next_rate: Rate,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeRateRecord {
    current_rate: Rate,
    next_rate: Rate,
}

impl TryFrom<ExchangeRateRecord> for ExchangeRate {
    type Error = RateError;

    fn try_from(record: ExchangeRateRecord) -> RateResult<Self> {
        ExchangeRate::new(record.current_rate, record.next_rate)
    }
}

impl ExchangeRate {
    /// Pair two rates. The next rate must expire strictly after the current.
    pub fn new(current_rate: Rate, next_rate: Rate) -> RateResult<Self> {
        if next_rate.expiration_time_seconds <= current_rate.expiration_time_seconds {
            return Err(RateError::ExpirationOrder {
                current: current_rate.expiration_time_seconds,
                next: next_rate.expiration_time_seconds,
            });
        }

        Ok(Self {
            current_rate,
            next_rate,
        })
    }

    pub fn current_rate(&self) -> &Rate {
        &self.current_rate
    }

    pub fn next_rate(&self) -> &Rate {
        &self.next_rate
    }

    pub fn current_expiration_time_seconds(&self) -> i64 {
        self.current_rate.expiration_time_seconds
    }

    pub fn next_expiration_time_seconds(&self) -> i64 {
        self.next_rate.expiration_time_seconds
    }

    /// True when the next rate expires on a UTC day boundary. Such a rate
    /// becomes the following day's midnight anchor.
    pub fn is_midnight_time(&self) -> bool {
        is_day_boundary(self.next_rate.expiration_time_seconds)
    }
}
