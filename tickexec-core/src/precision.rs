//! Fixed-precision rounding for every monetary field.
//!
//! All ledgers (order, stage, balance, statistics) are rounded to
//! [`PRECISION_DIGITS`] fractional digits after every arithmetic step, so
//! repeated undo/redo accounting never accumulates drift.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of fractional digits kept on every monetary field.
pub const PRECISION_DIGITS: u32 = 10;

/// Round a value to [`PRECISION_DIGITS`] fractional digits (half away from zero).
pub fn precise(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PRECISION_DIGITS, RoundingStrategy::MidpointAwayFromZero)
}

/// True if `value` carries no digits beyond [`PRECISION_DIGITS`].
pub fn is_precise(value: Decimal) -> bool {
    precise(value) == value
}

/// `value × percentage / 100`, rounded.
pub fn percent_of(value: Decimal, percentage: Decimal) -> Decimal {
    precise(value * percentage / Decimal::ONE_HUNDRED)
}

/// [`percent_of`], or `None` when the product leaves the decimal range.
pub fn checked_percent_of(value: Decimal, percentage: Decimal) -> Option<Decimal> {
    value
        .checked_mul(percentage)?
        .checked_div(Decimal::ONE_HUNDRED)
        .map(precise)
}
