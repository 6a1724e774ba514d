//! Stabilization and floor policy applied to a freshly computed rate.

use hbar_rate_common::{Rate, RateError, RateResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Limits how far and how low a candidate rate may go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StabilizationPolicy {
    /// Largest relative move allowed away from the midnight anchor.
    bound: Decimal,
    /// Minimum cents per one HBAR.
    floor_cents: Decimal,
}

impl StabilizationPolicy {
    /// Create a new policy.
    pub fn new(bound: Decimal, floor_cents: Decimal) -> Self {
        Self { bound, floor_cents }
    }

    pub fn bound(&self) -> Decimal {
        self.bound
    }

    pub fn floor_cents(&self) -> Decimal {
        self.floor_cents
    }

    /// Stabilize against the anchor, then enforce the floor.
    pub fn apply(&self, midnight: Option<&Rate>, candidate: Rate) -> RateResult<Rate> {
        let stabilized = self.stabilize(midnight, candidate)?;
        self.enforce_floor(stabilized)
    }

    /// Clip `candidate` toward `midnight` if it moved further than the bound.
    ///
    /// Without an anchor the candidate is accepted as is.
    pub fn stabilize(&self, midnight: Option<&Rate>, candidate: Rate) -> RateResult<Rate> {
        let Some(midnight) = midnight else {
            debug!("No midnight rate, accepting candidate");
            return Ok(candidate);
        };

        if midnight.is_small_change(self.bound, &candidate)? {
            debug!(
                midnight = %midnight,
                candidate = %candidate,
                "Candidate within bound of midnight rate"
            );
            return Ok(candidate);
        }

        let clipped = midnight.clip_rate(&candidate, self.bound)?;
        warn!(
            midnight = %midnight,
            candidate_cents = candidate.cent_equivalent(),
            clipped_cents = clipped.cent_equivalent(),
            bound = %self.bound,
            "Candidate outside bound, clipping"
        );
        Ok(clipped)
    }

    /// Smallest cent equivalent allowed for `hbar_equivalent` HBAR, rounded
    /// up so the floored price never falls below the floor.
    pub fn floor_cent_equivalent(&self, hbar_equivalent: i64) -> RateResult<i64> {
        self.floor_cents
            .checked_mul(Decimal::from(hbar_equivalent))
            .and_then(|cents| cents.ceil().to_i64())
            .ok_or(RateError::Overflow("floor cent equivalent"))
    }

    /// Raise `rate` to the floor price if it is below it.
    ///
    /// The floored cent equivalent is `ceil(floor_cents * hbar_equivalent)`
    /// rather than the bare product, since a rate holds whole cents. The two
    /// agree whenever the product is integral.
    pub fn enforce_floor(&self, rate: Rate) -> RateResult<Rate> {
        let floored = rate
            .cent_equivalent()
            .max(self.floor_cent_equivalent(rate.hbar_equivalent())?);

        if floored == rate.cent_equivalent() {
            return Ok(rate);
        }

        warn!(
            calculated = rate.cent_equivalent(),
            floored,
            "Flooring the rate"
        );
        Rate::new(
            rate.hbar_equivalent(),
            floored,
            rate.expiration_time_seconds(),
        )
    }
}
