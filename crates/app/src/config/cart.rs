//! Cart Config

use std::{path::PathBuf, time::Duration};

use clap::Args;
use trolley::config::{CartConfig, ConfigError, DEFAULT_MAX_QUANTITY_PER_ITEM};

use crate::retry::{DEFAULT_MAX_RETRIES, RetryPolicy};

/// Cart rules and client behaviour.
#[derive(Debug, Args)]
pub struct CartSettings {
    /// ISO 4217 code of the store currency
    #[arg(long, env = "CART_CURRENCY", default_value = "INR")]
    pub currency: String,

    /// Subtotal at which delivery becomes free, in major units
    #[arg(long, env = "CART_FREE_DELIVERY_THRESHOLD", default_value = "500")]
    pub free_delivery_threshold: String,

    /// Delivery fee below the threshold, in major units
    #[arg(long, env = "CART_DELIVERY_FEE", default_value = "25")]
    pub delivery_fee: String,

    /// Most units of one product a line may hold
    #[arg(
        long,
        env = "CART_MAX_QUANTITY_PER_ITEM",
        default_value_t = DEFAULT_MAX_QUANTITY_PER_ITEM
    )]
    pub max_quantity_per_item: u32,

    /// Quiet period before a quantity change is sent, in milliseconds
    #[arg(long, env = "CART_DEBOUNCE_MS", default_value_t = 350_u64)]
    pub debounce_ms: u64,

    /// Extra attempts when loading the cart fails with a server or network error
    #[arg(long, env = "CART_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Pause before retrying a failed load, in milliseconds
    #[arg(long, env = "CART_RETRY_DELAY_MS", default_value_t = 1_000_u64)]
    pub retry_delay_ms: u64,

    /// File holding the last known-good cart
    #[arg(long, env = "CART_BACKUP_PATH", default_value = ".trolley/cart.json")]
    pub backup_path: PathBuf,
}

impl CartSettings {
    /// The cart rules.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the currency is unknown or an amount is invalid.
    pub fn cart_config(&self) -> Result<CartConfig, ConfigError> {
        CartConfig::parse(
            &self.currency,
            &self.free_delivery_threshold,
            &self.delivery_fee,
            self.max_quantity_per_item,
        )
    }

    /// Retry policy for cart loads.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_delay_ms))
    }

    /// Debounce window for quantity changes.
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
