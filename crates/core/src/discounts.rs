//! Discounts
//!
//! Percentage discount arithmetic on minor units, shared by payload normalization and totals.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use thiserror::Error;

use crate::items::discount_fraction;

/// Errors specific to discount calculations.
#[derive(Debug, Error, PartialEq)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,
}

/// Build a discount from percentage points as the backend sends them (`20` for 20% off).
///
/// Values are clamped into `0..=100`.
pub fn percentage_from_points(points: Decimal) -> Percentage {
    let points = points.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);

    Percentage::from(points / Decimal::ONE_HUNDRED)
}

/// Percentage points of a discount (`20` for 20% off).
pub fn points_from_percentage(discount: Percentage) -> Decimal {
    (discount_fraction(discount) * Decimal::ONE_HUNDRED).normalize()
}

/// Calculate the discount amount in minor units based on a percentage and a minor unit amount.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the calculation overflows or cannot be
/// represented in minor units.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::PercentConversion)?;

    discount_fraction(*percent)
        .checked_mul(minor)
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}

/// Unit price after applying `discount` to `original_minor`.
///
/// A discount outside `0..=100%` is clamped, so the result always lies in
/// `0..=original_minor` for a non-negative original.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the calculation overflows.
pub fn discounted_minor(original_minor: i64, discount: &Percentage) -> Result<i64, DiscountError> {
    let off = percent_of_minor(discount, original_minor)?.clamp(0, original_minor.max(0));

    original_minor
        .checked_sub(off)
        .ok_or(DiscountError::PercentConversion)
}
