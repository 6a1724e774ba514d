//! Median of acquired quote prices.

use rust_decimal::Decimal;

/// Order-statistic median of the positive prices in `prices`.
///
/// Zero and negative prices are dropped first. Even counts average the two
/// middle values. Returns `None` when nothing usable remains.
pub fn median(prices: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    let mut prices: Vec<Decimal> = prices
        .into_iter()
        .filter(|price| price.is_sign_positive() && !price.is_zero())
        .collect();

    if prices.is_empty() {
        return None;
    }

    prices.sort();
    let mid_idx = prices.len() / 2;

    if prices.len() % 2 == 0 {
        // low + gap / 2 never exceeds high, so it cannot overflow.
        let (low, high) = (prices[mid_idx - 1], prices[mid_idx]);
        Some(low + (high - low) / Decimal::TWO)
    } else {
        Some(prices[mid_idx])
    }
}
