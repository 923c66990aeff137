//! Cart backend

use async_trait::async_trait;
use mockall::automock;
use serde::Serialize;
use trolley::{
    items::{CartItemId, ProductId, Variant},
    payload::CartData,
};

pub mod errors;
pub mod http;

pub use errors::BackendError;
pub use http::{HttpCartBackend, HttpConfigError};

/// Body of an add-item request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartItem {
    /// Product to add.
    pub product_id: ProductId,

    /// Units to add.
    pub quantity: u32,

    /// Chosen product options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<Variant>,
}

/// Remote cart operations.
///
/// Implementations only move data; every cart decision is made by [`Cart`](crate::cart::Cart).
#[automock]
#[async_trait]
pub trait CartBackend: Send + Sync {
    /// Fetch the cart contents as sent by the backend.
    async fn fetch_cart(&self) -> Result<CartData, BackendError>;

    /// Add a product to the cart.
    async fn add_item(&self, item: NewCartItem) -> Result<(), BackendError>;

    /// Remove a line from the cart.
    async fn remove_item(&self, cart_id: CartItemId) -> Result<(), BackendError>;

    /// Set the quantity of a line.
    async fn update_quantity(&self, cart_id: CartItemId, quantity: u32)
    -> Result<(), BackendError>;

    /// Remove every line from the cart.
    async fn clear(&self) -> Result<(), BackendError>;

    /// Apply a coupon code to the cart.
    async fn apply_coupon(&self, code: String) -> Result<(), BackendError>;

    /// Remove a coupon code from the cart.
    async fn remove_coupon(&self, code: String) -> Result<(), BackendError>;
}
