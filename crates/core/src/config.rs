//! Cart Configuration

use rust_decimal::Decimal;
use rusty_money::{Findable, Money, iso::Currency};
use thiserror::Error;

use crate::money::minor_from_decimal;

/// Default free-delivery threshold, in major units.
pub const DEFAULT_FREE_DELIVERY_THRESHOLD: i64 = 500;

/// Default delivery fee charged below the threshold, in major units.
pub const DEFAULT_DELIVERY_FEE: i64 = 25;

/// Default upper bound on the quantity of a single line item.
pub const DEFAULT_MAX_QUANTITY_PER_ITEM: u32 = 10;

/// Errors raised while building a [`CartConfig`].
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The currency code is not a known ISO currency.
    #[error("unknown currency: {0}")]
    UnknownCurrency(String),

    /// An amount could not be parsed or does not fit in minor units.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// An amount was negative.
    #[error("amount must not be negative: {0}")]
    NegativeAmount(String),

    /// The per-item maximum was zero.
    #[error("maximum quantity per item must be at least 1")]
    ZeroMaximumQuantity,
}

/// Static pricing configuration for a cart.
///
/// Supplied once at construction; totals are a pure function of the cart's line items and this
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartConfig {
    currency: &'static Currency,
    free_delivery_threshold: Money<'static, Currency>,
    delivery_fee: Money<'static, Currency>,
    max_quantity_per_item: u32,
}

impl CartConfig {
    /// Create a new configuration with amounts given in minor units.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if either amount is negative or the maximum quantity is zero.
    pub fn new(
        currency: &'static Currency,
        free_delivery_threshold_minor: i64,
        delivery_fee_minor: i64,
        max_quantity_per_item: u32,
    ) -> Result<Self, ConfigError> {
        if free_delivery_threshold_minor < 0 {
            return Err(ConfigError::NegativeAmount(
                free_delivery_threshold_minor.to_string(),
            ));
        }

        if delivery_fee_minor < 0 {
            return Err(ConfigError::NegativeAmount(delivery_fee_minor.to_string()));
        }

        if max_quantity_per_item == 0 {
            return Err(ConfigError::ZeroMaximumQuantity);
        }

        Ok(Self {
            currency,
            free_delivery_threshold: Money::from_minor(free_delivery_threshold_minor, currency),
            delivery_fee: Money::from_minor(delivery_fee_minor, currency),
            max_quantity_per_item,
        })
    }

    /// Build a configuration from a currency code and amounts in major units (e.g. `"500"`).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the currency is unknown, an amount cannot be parsed, or the
    /// values are out of range.
    pub fn parse(
        currency_code: &str,
        free_delivery_threshold: &str,
        delivery_fee: &str,
        max_quantity_per_item: u32,
    ) -> Result<Self, ConfigError> {
        let currency = currency_from_code(currency_code)?;

        Self::new(
            currency,
            parse_amount(free_delivery_threshold, currency)?,
            parse_amount(delivery_fee, currency)?,
            max_quantity_per_item,
        )
    }

    /// Currency every amount in the cart is expressed in.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Subtotal at or above which delivery is free.
    pub fn free_delivery_threshold(&self) -> Money<'static, Currency> {
        self.free_delivery_threshold
    }

    /// Fee charged when the subtotal is below the threshold.
    pub fn delivery_fee(&self) -> Money<'static, Currency> {
        self.delivery_fee
    }

    /// Largest quantity a single line item may hold.
    pub fn max_quantity_per_item(&self) -> u32 {
        self.max_quantity_per_item
    }
}

impl Default for CartConfig {
    fn default() -> Self {
        let currency = rusty_money::iso::INR;
        let scale = 10_i64.pow(currency.exponent);

        Self {
            currency,
            free_delivery_threshold: Money::from_minor(
                DEFAULT_FREE_DELIVERY_THRESHOLD * scale,
                currency,
            ),
            delivery_fee: Money::from_minor(DEFAULT_DELIVERY_FEE * scale, currency),
            max_quantity_per_item: DEFAULT_MAX_QUANTITY_PER_ITEM,
        }
    }
}

/// Look up an ISO currency by its alphabetic code (e.g. `"GBP"`), case-insensitively.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownCurrency`] if the code is not recognised.
pub fn currency_from_code(code: &str) -> Result<&'static Currency, ConfigError> {
    let code = code.trim().to_ascii_uppercase();

    Currency::find(&code).ok_or(ConfigError::UnknownCurrency(code))
}

/// Parse a major-unit amount string (e.g. `"25"` or `"19.99"`) into minor units.
fn parse_amount(value: &str, currency: &Currency) -> Result<i64, ConfigError> {
    let amount = value
        .trim()
        .parse::<Decimal>()
        .map_err(|_err| ConfigError::InvalidAmount(value.to_string()))?;

    minor_from_decimal(amount, currency).ok_or_else(|| ConfigError::InvalidAmount(value.to_string()))
}
