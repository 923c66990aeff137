//! Trolley prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    config::{CartConfig, ConfigError, currency_from_code},
    discounts::{DiscountError, discounted_minor, percent_of_minor},
    items::{CartItemId, LineItem, ProductId, Variant},
    payload::{CartData, CartEnvelope, PayloadError, normalize_items},
    quantity::{QuantityDecision, QuantityRejection, check_quantity},
    snapshot::{Snapshot, SnapshotError},
    totals::{Totals, TotalsError, calculate_totals},
};
