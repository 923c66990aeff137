//! In-memory cart backend.

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde_json::{Value, json};
use trolley::{
    items::{CartItemId, ProductId, Variant},
    payload::CartData,
};

use crate::backend::{BackendError, CartBackend, NewCartItem};

/// Timestamp every fake line reports as its `addedAt`.
pub(crate) const ADDED_AT: &str = "2026-01-01T00:00:00Z";

/// A request received by [`FakeBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Fetch,
    Add(NewCartItem),
    Remove(CartItemId),
    Update(CartItemId, u32),
    Clear,
    ApplyCoupon(String),
    RemoveCoupon(String),
}

#[derive(Debug, Clone)]
struct Product {
    price: i64,
    stock: Option<u32>,
}

#[derive(Debug, Clone)]
struct Line {
    cart_id: CartItemId,
    product_id: ProductId,
    quantity: u32,
    variant: Option<Variant>,
}

#[derive(Debug, Default)]
struct State {
    catalog: FxHashMap<ProductId, Product>,
    lines: Vec<Line>,
    next_line: u32,
    fetch_failures: VecDeque<BackendError>,
    mutation_failures: VecDeque<BackendError>,
    calls: Vec<Call>,
}

/// Stateful stand-in for the storefront API.
#[derive(Debug, Default)]
pub(crate) struct FakeBackend {
    state: Mutex<State>,
    fetch_delay: Duration,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make every fetch take `delay` to answer.
    pub(crate) fn with_fetch_delay(delay: Duration) -> Self {
        Self {
            fetch_delay: delay,
            ..Self::default()
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// List a product with a price in major units.
    pub(crate) fn product(&self, product_id: &str, price: i64, stock: Option<u32>) {
        self.state()
            .catalog
            .insert(ProductId::new(product_id), Product { price, stock });
    }

    /// Put a line in the cart without recording a call.
    pub(crate) fn seed(&self, cart_id: &str, product_id: &str, quantity: u32) {
        self.state().lines.push(Line {
            cart_id: CartItemId::new(cart_id),
            product_id: ProductId::new(product_id),
            quantity,
            variant: None,
        });
    }

    /// Fail the next fetch that has no failure queued before it.
    pub(crate) fn fail_fetch(&self, error: BackendError) {
        self.state().fetch_failures.push_back(error);
    }

    /// Fail the next mutation that has no failure queued before it.
    pub(crate) fn fail_mutation(&self, error: BackendError) {
        self.state().mutation_failures.push_back(error);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub(crate) fn fetches(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| **call == Call::Fetch)
            .count()
    }

    /// Calls other than fetches.
    pub(crate) fn mutations(&self) -> Vec<Call> {
        self.state()
            .calls
            .iter()
            .filter(|call| **call != Call::Fetch)
            .cloned()
            .collect()
    }

    fn record(&self, call: Call) -> Result<MutexGuard<'_, State>, BackendError> {
        let mut state = self.state();
        let fetch = call == Call::Fetch;

        state.calls.push(call);

        let failure = if fetch {
            state.fetch_failures.pop_front()
        } else {
            state.mutation_failures.pop_front()
        };

        match failure {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }
}

fn entry(state: &State, line: &Line) -> Value {
    let product = state.catalog.get(&line.product_id);

    json!({
        "_id": line.cart_id,
        "quantity": line.quantity,
        "variant": line.variant,
        "addedAt": ADDED_AT,
        "product": {
            "_id": line.product_id,
            "name": line.product_id,
            "price": product.map_or(0, |product| product.price),
            "stock": product.and_then(|product| product.stock),
        }
    })
}

#[async_trait]
impl CartBackend for FakeBackend {
    async fn fetch_cart(&self) -> Result<CartData, BackendError> {
        if !self.fetch_delay.is_zero() {
            tokio::time::sleep(self.fetch_delay).await;
        }

        let state = self.record(Call::Fetch)?;
        let items = state.lines.iter().map(|line| entry(&state, line)).collect();

        Ok(CartData::Items { items })
    }

    async fn add_item(&self, item: NewCartItem) -> Result<(), BackendError> {
        let mut state = self.record(Call::Add(item.clone()))?;

        let existing = state
            .lines
            .iter_mut()
            .find(|line| line.product_id == item.product_id && line.variant == item.variant);

        if let Some(line) = existing {
            line.quantity += item.quantity;
        } else {
            state.next_line += 1;

            let cart_id = CartItemId::new(format!("line-{}", state.next_line));

            state.lines.push(Line {
                cart_id,
                product_id: item.product_id,
                quantity: item.quantity,
                variant: item.variant,
            });
        }

        Ok(())
    }

    async fn remove_item(&self, cart_id: CartItemId) -> Result<(), BackendError> {
        let mut state = self.record(Call::Remove(cart_id.clone()))?;

        state.lines.retain(|line| line.cart_id != cart_id);

        Ok(())
    }

    async fn update_quantity(
        &self,
        cart_id: CartItemId,
        quantity: u32,
    ) -> Result<(), BackendError> {
        let mut state = self.record(Call::Update(cart_id.clone(), quantity))?;

        if let Some(line) = state.lines.iter_mut().find(|line| line.cart_id == cart_id) {
            line.quantity = quantity;
        }

        Ok(())
    }

    async fn clear(&self) -> Result<(), BackendError> {
        let mut state = self.record(Call::Clear)?;

        state.lines.clear();

        Ok(())
    }

    async fn apply_coupon(&self, code: String) -> Result<(), BackendError> {
        self.record(Call::ApplyCoupon(code)).map(drop)
    }

    async fn remove_coupon(&self, code: String) -> Result<(), BackendError> {
        self.record(Call::RemoveCoupon(code)).map(drop)
    }
}
