//! Money conversion between domain [`Decimal`] amounts and stored cents.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::{LeaseholdError, LeaseholdResult};

/// Convert a non-negative amount to integer cents, rounding to 2 decimal
/// places (banker's rounding, as `Decimal::round_dp` does).
pub fn to_cents(field: &str, amount: Decimal) -> LeaseholdResult<i64> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(LeaseholdError::validation(format!(
            "{field} must not be negative"
        )));
    }
    (amount.round_dp(2) * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or_else(|| LeaseholdError::validation(format!("{field} is out of range")))
}

pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}
