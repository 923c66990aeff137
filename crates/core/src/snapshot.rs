//! Backup snapshots
//!
//! The last known-good cart, in a form that can be written to local storage and read back when
//! the backend is unreachable.

use jiff::Timestamp;
use rust_decimal::Decimal;
use rusty_money::Money;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    config::CartConfig,
    discounts::{percentage_from_points, points_from_percentage},
    items::{CartItemId, LineItem, ProductId, Variant},
};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors raised while restoring a snapshot.
#[derive(Debug, Error, PartialEq)]
pub enum SnapshotError {
    /// The snapshot was written by an incompatible version.
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),

    /// The snapshot was taken in a different currency from the cart.
    #[error("snapshot currency {0} does not match cart currency {1}")]
    CurrencyMismatch(String, &'static str),
}

/// Serializable copy of a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Format version.
    pub version: u32,

    /// ISO code of the currency all amounts are in.
    pub currency: String,

    /// When the snapshot was taken.
    pub saved_at: Timestamp,

    /// Line items.
    pub items: Vec<SnapshotItem>,
}

/// Serializable copy of one line item, with amounts in minor units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[expect(missing_docs, reason = "mirrors the documented fields of `LineItem`")]
pub struct SnapshotItem {
    pub cart_id: CartItemId,
    pub product_id: ProductId,
    pub name: String,
    pub image: String,
    pub price_minor: i64,
    pub original_price_minor: i64,
    pub discount: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub variant: Option<Variant>,
    #[serde(default)]
    pub seller: Option<Value>,
    #[serde(default)]
    pub category: Option<Value>,
    #[serde(default)]
    pub delivery_info: Option<Value>,
    pub added_at: Timestamp,
}

impl From<&LineItem> for SnapshotItem {
    fn from(item: &LineItem) -> Self {
        Self {
            cart_id: item.cart_id.clone(),
            product_id: item.product_id.clone(),
            name: item.name.clone(),
            image: item.image.clone(),
            price_minor: item.price.to_minor_units(),
            original_price_minor: item.original_price.to_minor_units(),
            discount: points_from_percentage(item.discount),
            quantity: item.quantity,
            stock: item.stock,
            variant: item.variant.clone(),
            seller: item.seller.clone(),
            category: item.category.clone(),
            delivery_info: item.delivery_info.clone(),
            added_at: item.added_at,
        }
    }
}

impl Snapshot {
    /// Take a snapshot of the given line items.
    pub fn capture(items: &[LineItem], config: &CartConfig) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            currency: config.currency().iso_alpha_code.to_string(),
            saved_at: Timestamp::now(),
            items: items.iter().map(SnapshotItem::from).collect(),
        }
    }

    /// Whether the snapshot holds no line items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Turn the snapshot back into line items.
    ///
    /// Items with a zero quantity are skipped.
    ///
    /// # Errors
    ///
    /// Returns a [`SnapshotError`] if the version or currency does not match.
    pub fn restore(self, config: &CartConfig) -> Result<Vec<LineItem>, SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(self.version));
        }

        let currency = config.currency();

        if !self.currency.eq_ignore_ascii_case(currency.iso_alpha_code) {
            return Err(SnapshotError::CurrencyMismatch(
                self.currency,
                currency.iso_alpha_code,
            ));
        }

        Ok(self
            .items
            .into_iter()
            .filter(|item| item.quantity > 0)
            .map(|item| LineItem {
                cart_id: item.cart_id,
                product_id: item.product_id,
                name: item.name,
                image: item.image,
                price: Money::from_minor(item.price_minor, currency),
                original_price: Money::from_minor(item.original_price_minor, currency),
                discount: percentage_from_points(item.discount),
                quantity: item.quantity,
                stock: item.stock,
                variant: item.variant,
                seller: item.seller,
                category: item.category,
                delivery_info: item.delivery_info,
                added_at: item.added_at,
            })
            .collect())
    }
}
