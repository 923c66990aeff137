//! Totals
//!
//! Derived cart figures. [`Totals`] holds no state of its own: it is recomputed from the line
//! items and the [`CartConfig`] on every read, so it cannot drift from the cart contents.

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::FromPrimitive};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{config::CartConfig, items::LineItem};

/// Errors that can occur while calculating totals.
#[derive(Debug, Error, PartialEq)]
pub enum TotalsError {
    /// A sum or product left the range of minor units.
    #[error("cart totals overflowed")]
    Overflow,

    /// A line item is priced in a different currency from the cart.
    #[error("item {0} has currency {1}, but cart has currency {2}")]
    CurrencyMismatch(usize, &'static str, &'static str),
}

/// Figures derived from the current cart contents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    /// Number of distinct lines.
    pub line_count: usize,

    /// Sum of quantities over all lines.
    pub item_count: u64,

    /// Sum of `price * quantity`.
    pub subtotal: Money<'static, Currency>,

    /// Sum of per-line savings against the original price.
    pub savings: Money<'static, Currency>,

    /// Delivery fee, waived at or above the free-delivery threshold.
    pub delivery_fee: Money<'static, Currency>,

    /// `subtotal + delivery_fee`.
    pub total: Money<'static, Currency>,

    /// How much more must be spent to reach free delivery.
    pub amount_for_free_delivery: Money<'static, Currency>,

    /// Progress towards the free-delivery threshold, capped at 100%.
    pub free_delivery_progress: Percentage,
}

impl Totals {
    /// Whether the delivery fee is waived.
    pub fn has_free_delivery(&self) -> bool {
        self.delivery_fee.to_minor_units() == 0
    }
}

/// Calculate the totals of a cart.
///
/// # Errors
///
/// - [`TotalsError::CurrencyMismatch`]: an item is not priced in the configured currency.
/// - [`TotalsError::Overflow`]: a sum left the range of minor units.
pub fn calculate_totals(items: &[LineItem], config: &CartConfig) -> Result<Totals, TotalsError> {
    let currency = config.currency();

    let mut item_count: u64 = 0;
    let mut subtotal: i64 = 0;
    let mut savings: i64 = 0;

    for (idx, item) in items.iter().enumerate() {
        for money in [&item.price, &item.original_price] {
            if money.currency() != currency {
                return Err(TotalsError::CurrencyMismatch(
                    idx,
                    money.currency().iso_alpha_code,
                    currency.iso_alpha_code,
                ));
            }
        }

        item_count = item_count
            .checked_add(u64::from(item.quantity))
            .ok_or(TotalsError::Overflow)?;

        subtotal = item
            .line_total_minor()
            .and_then(|line| subtotal.checked_add(line))
            .ok_or(TotalsError::Overflow)?;

        savings = item
            .line_savings_minor()
            .and_then(|line| savings.checked_add(line))
            .ok_or(TotalsError::Overflow)?;
    }

    let threshold = config.free_delivery_threshold().to_minor_units();

    let delivery_fee = if subtotal >= threshold {
        0
    } else {
        config.delivery_fee().to_minor_units()
    };

    let total = subtotal
        .checked_add(delivery_fee)
        .ok_or(TotalsError::Overflow)?;

    let amount_for_free_delivery = threshold.saturating_sub(subtotal).max(0);

    Ok(Totals {
        line_count: items.len(),
        item_count,
        subtotal: Money::from_minor(subtotal, currency),
        savings: Money::from_minor(savings, currency),
        delivery_fee: Money::from_minor(delivery_fee, currency),
        total: Money::from_minor(total, currency),
        amount_for_free_delivery: Money::from_minor(amount_for_free_delivery, currency),
        free_delivery_progress: progress(subtotal, threshold),
    })
}

fn progress(subtotal: i64, threshold: i64) -> Percentage {
    if threshold <= 0 || subtotal >= threshold {
        return Percentage::from(1.0);
    }

    // Avoid integer division truncation by doing the ratio in decimal space.
    let subtotal = Decimal::from_i64(subtotal.max(0)).unwrap_or(Decimal::ZERO);
    let threshold = Decimal::from_i64(threshold).unwrap_or(Decimal::ONE);

    Percentage::from(subtotal / threshold)
}
