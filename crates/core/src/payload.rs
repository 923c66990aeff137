//! Cart payloads
//!
//! The backend answers `GET /cart` with an envelope of the form
//! `{ "success": true, "data": { "items": [...] } }`, or with `data` holding the array directly.
//! Those two shapes are the whole contract: anything else is a [`PayloadError`].
//!
//! Individual entries are more forgiving. Product details may be nested under `product` or sent
//! flat on the entry, display fields fall back to placeholders, and an entry that cannot be
//! resolved to a product is dropped rather than kept as a malformed line.

use decimal_percentage::Percentage;
use jiff::Timestamp;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::{
    config::CartConfig,
    discounts::{DiscountError, discounted_minor, percentage_from_points},
    items::{CartItemId, LineItem, PLACEHOLDER_IMAGE, PLACEHOLDER_NAME, ProductId, Variant},
    money::minor_from_decimal,
};

/// Errors raised while reading a cart envelope.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The body is not valid JSON or does not match either envelope shape.
    #[error("malformed cart payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The envelope reported `success: false`.
    #[error("cart request was not successful")]
    Unsuccessful(Option<String>),

    /// The envelope carried no `data`.
    #[error("cart payload has no data")]
    MissingData,
}

/// Response envelope of `GET /cart`.
#[derive(Debug, Deserialize)]
pub struct CartEnvelope {
    /// Whether the backend considers the request successful.
    #[serde(default)]
    pub success: Option<bool>,

    /// Human readable message, mostly present on failure.
    #[serde(default)]
    pub message: Option<String>,

    /// Cart contents.
    #[serde(default)]
    pub data: Option<CartData>,
}

/// The two accepted shapes of the envelope's `data`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CartData {
    /// `{ "items": [...] }`
    Items {
        /// Raw cart entries.
        items: Vec<Value>,
    },

    /// `[...]`
    List(Vec<Value>),
}

impl CartData {
    /// The raw entries, whichever shape they arrived in.
    pub fn into_entries(self) -> Vec<Value> {
        match self {
            Self::Items { items } => items,
            Self::List(items) => items,
        }
    }
}

impl CartEnvelope {
    /// Parse an envelope from a response body.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Malformed`] if the body does not match the envelope shape.
    pub fn from_slice(body: &[u8]) -> Result<Self, PayloadError> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Normalize the envelope's entries into line items.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Unsuccessful`] if the envelope reports failure and
    /// [`PayloadError::MissingData`] if it carries no data.
    pub fn into_items(self, config: &CartConfig) -> Result<Vec<LineItem>, PayloadError> {
        if self.success == Some(false) {
            return Err(PayloadError::Unsuccessful(self.message));
        }

        let data = self.data.ok_or(PayloadError::MissingData)?;

        Ok(normalize_items(data.into_entries(), config))
    }
}

/// Why a single entry was left out of the cart.
#[derive(Debug, Error)]
enum SkipReason {
    #[error("entry does not match the cart item shape: {0}")]
    Shape(#[source] serde_json::Error),

    #[error("entry has no product identifier")]
    MissingProductId,

    #[error("entry has a non-positive or oversized quantity: {0}")]
    Quantity(i64),

    #[error("entry price cannot be represented in minor units")]
    Price,

    #[error(transparent)]
    Discount(#[from] DiscountError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawCartItem {
    #[serde(alias = "_id")]
    cart_id: Option<Value>,
    product: Option<RawProduct>,
    product_id: Option<Value>,
    name: Option<String>,
    image: Option<String>,
    price: Option<Decimal>,
    original_price: Option<Decimal>,
    discount: Option<Decimal>,
    quantity: Option<i64>,
    stock: Option<i64>,
    variant: Option<Value>,
    seller: Option<Value>,
    category: Option<Value>,
    delivery_info: Option<Value>,
    added_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawProduct {
    #[serde(rename = "_id")]
    object_id: Option<Value>,
    id: Option<Value>,
    name: Option<String>,
    image: Option<String>,
    images: Option<Vec<String>>,
    price: Option<Decimal>,
    discount: Option<Decimal>,
    stock: Option<i64>,
    seller: Option<Value>,
    category: Option<Value>,
    delivery_info: Option<Value>,
}

/// Normalize raw cart entries into line items, dropping entries that cannot be resolved.
pub fn normalize_items(entries: Vec<Value>, config: &CartConfig) -> Vec<LineItem> {
    let currency = config.currency();

    entries
        .into_iter()
        .enumerate()
        .filter_map(
            |(index, entry)| match normalize_entry(entry, index, currency) {
                Ok(item) => Some(item),
                Err(reason) => {
                    warn!(index, %reason, "dropping cart entry");
                    None
                }
            },
        )
        .collect()
}

fn normalize_entry(
    entry: Value,
    position: usize,
    currency: &'static Currency,
) -> Result<LineItem, SkipReason> {
    let raw: RawCartItem = serde_json::from_value(entry).map_err(SkipReason::Shape)?;
    let product = raw.product.unwrap_or_default();

    let product_id = product
        .object_id
        .as_ref()
        .and_then(id_from_value)
        .or_else(|| product.id.as_ref().and_then(id_from_value))
        .or_else(|| raw.product_id.as_ref().and_then(id_from_value))
        .map(ProductId::new)
        .ok_or(SkipReason::MissingProductId)?;

    let cart_id = raw
        .cart_id
        .as_ref()
        .and_then(id_from_value)
        .map_or_else(|| CartItemId::temporary(&product_id, position), CartItemId::new);

    let requested = raw.quantity.unwrap_or(1);

    let quantity = u32::try_from(requested)
        .ok()
        .filter(|quantity| *quantity > 0)
        .ok_or(SkipReason::Quantity(requested))?;

    let original = product
        .price
        .or(raw.original_price)
        .or(raw.price)
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO);

    let original_minor = minor_from_decimal(original, currency).ok_or(SkipReason::Price)?;

    let discount = product
        .discount
        .or(raw.discount)
        .map_or_else(|| Percentage::from(0.0), percentage_from_points);

    let price_minor = if product.discount.or(raw.discount).unwrap_or_default() > Decimal::ZERO {
        discounted_minor(original_minor, &discount)?
    } else {
        original_minor
    };

    let image = product
        .image
        .or_else(|| product.images.and_then(|images| images.into_iter().next()))
        .or(raw.image)
        .filter(|image| !image.is_empty())
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());

    Ok(LineItem {
        cart_id,
        product_id,
        name: product
            .name
            .or(raw.name)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| PLACEHOLDER_NAME.to_string()),
        image,
        price: Money::from_minor(price_minor, currency),
        original_price: Money::from_minor(original_minor, currency),
        discount,
        quantity,
        stock: product
            .stock
            .or(raw.stock)
            .map(|stock| u32::try_from(stock.max(0)).unwrap_or(u32::MAX)),
        variant: raw.variant.and_then(variant_from_value),
        seller: product.seller.or(raw.seller),
        category: product.category.or(raw.category),
        delivery_info: product.delivery_info.or(raw.delivery_info),
        added_at: raw
            .added_at
            .and_then(|added_at| added_at.parse::<Timestamp>().ok())
            .unwrap_or_else(Timestamp::now),
    })
}

/// Identifiers arrive as strings or numbers depending on the backend.
fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.trim().is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn variant_from_value(value: Value) -> Option<Variant> {
    let Value::Object(options) = value else {
        return None;
    };

    let variant: Variant = options
        .into_iter()
        .filter_map(|(name, value)| match value {
            Value::Null => None,
            Value::String(value) => Some((name, value)),
            other => Some((name, other.to_string())),
        })
        .collect();

    (!variant.is_empty()).then_some(variant)
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::INR;
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    fn parse(body: &Value) -> Result<Vec<LineItem>, PayloadError> {
        CartEnvelope::from_slice(body.to_string().as_bytes())?.into_items(&CartConfig::default())
    }

    #[test]
    fn nested_product_shape() -> TestResult {
        let items = parse(&json!({
            "success": true,
            "data": {
                "items": [{
                    "_id": "line-1",
                    "quantity": 3,
                    "product": {
                        "_id": "prod-1",
                        "name": "Kettle",
                        "images": ["/img/kettle.png"],
                        "price": 1000,
                        "discount": 20,
                        "stock": 7
                    }
                }]
            }
        }))?;

        let item = items.first().ok_or("expected one item")?;

        assert_eq!(item.cart_id, CartItemId::new("line-1"));
        assert_eq!(item.product_id, ProductId::new("prod-1"));
        assert_eq!(item.name, "Kettle");
        assert_eq!(item.image, "/img/kettle.png");
        assert_eq!(item.original_price, Money::from_minor(1000_00, INR));
        assert_eq!(item.price, Money::from_minor(800_00, INR));
        assert_eq!(item.quantity, 3);
        assert_eq!(item.stock, Some(7));

        Ok(())
    }

    #[test]
    fn flat_shape_with_bare_array() -> TestResult {
        let items = parse(&json!({
            "success": true,
            "data": [{
                "cartId": "line-2",
                "productId": 42,
                "price": 199.5,
                "quantity": 2,
                "variant": { "size": "M", "pack": 2, "colour": null }
            }]
        }))?;

        let item = items.first().ok_or("expected one item")?;

        assert_eq!(item.product_id, ProductId::new("42"));
        assert_eq!(item.name, PLACEHOLDER_NAME);
        assert_eq!(item.image, PLACEHOLDER_IMAGE);
        assert_eq!(item.price, Money::from_minor(199_50, INR));
        assert_eq!(item.original_price, item.price);
        assert!(!item.is_discounted());

        let variant = item.variant.as_ref().ok_or("expected variant")?;

        assert_eq!(variant.get("size").map(String::as_str), Some("M"));
        assert_eq!(variant.get("pack").map(String::as_str), Some("2"));
        assert!(!variant.contains_key("colour"));

        Ok(())
    }

    #[test]
    fn product_id_priority_prefers_nested_object_id() -> TestResult {
        let items = parse(&json!({
            "data": [{
                "productId": "flat",
                "product": { "_id": "object-id", "id": "plain-id" }
            }, {
                "productId": "flat",
                "product": { "id": "plain-id" }
            }, {
                "productId": "flat"
            }]
        }))?;

        let ids: Vec<&str> = items.iter().map(|item| item.product_id.as_str()).collect();

        assert_eq!(ids, ["object-id", "plain-id", "flat"]);

        Ok(())
    }

    #[test]
    fn entries_without_product_id_are_dropped() -> TestResult {
        let items = parse(&json!({
            "data": { "items": [
                { "name": "orphan", "price": 10 },
                { "productId": "", "price": 10 },
                { "productId": "kept", "price": 10 }
            ]}
        }))?;

        assert_eq!(items.len(), 1);

        Ok(())
    }

    #[test]
    fn non_positive_quantities_are_dropped() -> TestResult {
        let items = parse(&json!({
            "data": [
                { "productId": "a", "quantity": 0 },
                { "productId": "b", "quantity": -1 },
                { "productId": "c" }
            ]
        }))?;

        assert_eq!(items.len(), 1);
        assert_eq!(items.first().map(|item| item.quantity), Some(1));

        Ok(())
    }

    #[test]
    fn malformed_entries_are_dropped_not_fatal() -> TestResult {
        let items = parse(&json!({
            "data": [
                { "productId": "a", "price": "not a number" },
                "garbage",
                { "productId": "b", "price": "12.50" }
            ]
        }))?;

        assert_eq!(items.len(), 1);
        assert_eq!(
            items.first().map(|item| item.price),
            Some(Money::from_minor(12_50, INR))
        );

        Ok(())
    }

    #[test]
    fn missing_cart_id_gets_temporary_placeholder() -> TestResult {
        let items = parse(&json!({ "data": [{ "productId": "a" }] }))?;

        assert!(items.first().is_some_and(|item| item.cart_id.is_temporary()));

        Ok(())
    }

    #[test]
    fn placeholder_ids_are_stable_across_loads() -> TestResult {
        let body = json!({ "data": [
            { "productId": "p", "price": 10 },
            { "productId": "p", "price": 10, "variant": { "size": "L" } }
        ]});

        let first = parse(&body)?;
        let second = parse(&body)?;

        let ids = |items: &[LineItem]| {
            items
                .iter()
                .map(|item| item.cart_id.clone())
                .collect::<Vec<_>>()
        };

        assert_eq!(ids(&first), ids(&second));
        assert_eq!(
            ids(&first),
            [CartItemId::new("temp-p-0"), CartItemId::new("temp-p-1")]
        );

        // Without `addedAt` each load stamps its own time; everything else matches.
        let strip = |items: Vec<LineItem>| {
            items
                .into_iter()
                .map(|item| LineItem {
                    added_at: jiff::Timestamp::UNIX_EPOCH,
                    ..item
                })
                .collect::<Vec<_>>()
        };

        assert_eq!(strip(first), strip(second));

        Ok(())
    }

    #[test]
    fn added_at_is_parsed_when_present() -> TestResult {
        let items = parse(&json!({
            "data": [{ "productId": "a", "addedAt": "2026-02-21T12:00:00Z" }]
        }))?;

        let expected: Timestamp = "2026-02-21T12:00:00Z".parse()?;

        assert_eq!(items.first().map(|item| item.added_at), Some(expected));

        Ok(())
    }

    #[test]
    fn unsuccessful_envelope_is_an_error() {
        let result = parse(&json!({ "success": false, "message": "Cart locked" }));

        assert!(
            matches!(&result, Err(PayloadError::Unsuccessful(Some(message))) if message == "Cart locked"),
            "expected Unsuccessful, got {result:?}"
        );
    }

    #[test]
    fn legacy_available_items_shape_is_rejected() {
        let result = parse(&json!({ "success": true, "data": { "availableItems": [] } }));

        assert!(
            matches!(result, Err(PayloadError::Malformed(_))),
            "expected Malformed, got {result:?}"
        );
    }

    #[test]
    fn missing_data_is_an_error() {
        let result = parse(&json!({ "success": true }));

        assert!(
            matches!(result, Err(PayloadError::MissingData)),
            "expected MissingData, got {result:?}"
        );
    }
}
