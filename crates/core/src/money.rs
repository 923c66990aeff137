//! Money helpers
//!
//! Conversions between decimal amounts as they appear in backend payloads and the minor units
//! every calculation in this crate is performed in.

use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, iso::Currency};

/// Convert a decimal amount (e.g. `19.99`) into minor units of `currency`.
///
/// Rounds half away from zero. Returns `None` when the amount cannot be represented as `i64`.
pub fn minor_from_decimal(amount: Decimal, currency: &Currency) -> Option<i64> {
    let scale = 10_i64.checked_pow(currency.exponent)?;

    amount
        .checked_mul(Decimal::from(scale))?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Convert minor units of `currency` back into a decimal amount.
pub fn decimal_from_minor(minor: i64, currency: &Currency) -> Decimal {
    let Some(value) = Decimal::from_i64(minor) else {
        unreachable!("always returns `Some` for every `i64`")
    };

    value / Decimal::from(10_i64.pow(currency.exponent))
}

/// Zero in the given currency.
pub fn zero(currency: &'static Currency) -> Money<'static, Currency> {
    Money::from_minor(0, currency)
}
