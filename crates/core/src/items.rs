//! Items

use std::{collections::BTreeMap, fmt};

use decimal_percentage::Percentage;
use jiff::Timestamp;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix of locally generated line item identifiers.
pub const TEMPORARY_ID_PREFIX: &str = "temp-";

/// Display name used when the backend omits one.
pub const PLACEHOLDER_NAME: &str = "Product";

/// Image path used when the backend omits one.
pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder.png";

/// Selected product options (e.g. `size => "M"`).
pub type Variant = BTreeMap<String, String>;

/// Identifier of a single line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartItemId(String);

impl CartItemId {
    /// Wrap a backend-assigned identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Placeholder for a line the backend sent without an identifier.
    ///
    /// Derived from the product and the entry's position in the payload, so the same payload
    /// always yields the same ids.
    pub fn temporary(product_id: &ProductId, position: usize) -> Self {
        Self(format!("{TEMPORARY_ID_PREFIX}{product_id}-{position}"))
    }

    /// Whether this identifier was generated locally.
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMPORARY_ID_PREFIX)
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CartItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CartItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identifier of a catalogue product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Wrap a product identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A single product line in the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    /// Line identifier, unique within the cart.
    pub cart_id: CartItemId,

    /// Product this line refers to. The same product may appear on more than one line.
    pub product_id: ProductId,

    /// Display name.
    pub name: String,

    /// Display image path or URL.
    pub image: String,

    /// Unit price after discount.
    pub price: Money<'static, Currency>,

    /// Unit price before discount.
    pub original_price: Money<'static, Currency>,

    /// Fraction off the original price (`0.2` for 20% off).
    pub discount: Percentage,

    /// Units of the product on this line. Never zero.
    pub quantity: u32,

    /// Units available, when the backend reports it.
    pub stock: Option<u32>,

    /// Selected product options.
    pub variant: Option<Variant>,

    /// Seller details, passed through for display.
    pub seller: Option<Value>,

    /// Category details, passed through for display.
    pub category: Option<Value>,

    /// Delivery details, passed through for display.
    pub delivery_info: Option<Value>,

    /// When the line was added.
    pub added_at: Timestamp,
}

impl LineItem {
    /// Create a line with placeholder display fields, no discount and no stock information.
    pub fn new(
        cart_id: CartItemId,
        product_id: ProductId,
        price: Money<'static, Currency>,
        quantity: u32,
    ) -> Self {
        Self {
            cart_id,
            product_id,
            name: PLACEHOLDER_NAME.to_string(),
            image: PLACEHOLDER_IMAGE.to_string(),
            price,
            original_price: price,
            discount: Percentage::from(0.0),
            quantity: quantity.max(1),
            stock: None,
            variant: None,
            seller: None,
            category: None,
            delivery_info: None,
            added_at: Timestamp::now(),
        }
    }

    /// Whether a discount applies to this line.
    pub fn is_discounted(&self) -> bool {
        discount_fraction(self.discount) > Decimal::ZERO
    }

    /// Price of the whole line (`price * quantity`) in minor units.
    pub fn line_total_minor(&self) -> Option<i64> {
        self.price
            .to_minor_units()
            .checked_mul(i64::from(self.quantity))
    }

    /// Savings on the whole line in minor units, never negative.
    pub fn line_savings_minor(&self) -> Option<i64> {
        let unit = self
            .original_price
            .to_minor_units()
            .checked_sub(self.price.to_minor_units())?
            .max(0);

        unit.checked_mul(i64::from(self.quantity))
    }
}

/// The decimal fraction behind a percentage (`0.2` for 20%).
pub(crate) fn discount_fraction(discount: Percentage) -> Decimal {
    // decimal_percentage doesn't expose the underlying Decimal
    discount * Decimal::ONE
}

/// Find a line by its identifier.
pub fn find_line<'a>(items: &'a [LineItem], cart_id: &CartItemId) -> Option<&'a LineItem> {
    items.iter().find(|item| &item.cart_id == cart_id)
}
