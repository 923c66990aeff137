//! Test helpers for the cart.

use std::sync::Arc;

use rusty_money::{Money, iso::INR};
use trolley::{
    config::CartConfig,
    items::{CartItemId, LineItem, ProductId},
    snapshot::Snapshot,
};

use crate::{backup::MemoryBackupStore, cart::Cart};

mod backend;

pub(crate) use backend::{ADDED_AT, Call, FakeBackend};
pub(crate) use observer::RecordingObserver;

/// A cart wired to fakes, with handles on each of them.
pub(crate) struct TestCart {
    pub cart: Cart,
    pub backend: Arc<FakeBackend>,
    pub backup: Arc<MemoryBackupStore>,
    pub observer: Arc<RecordingObserver>,
}

impl TestCart {
    pub(crate) fn new(backend: FakeBackend) -> Self {
        Self::with_parts(backend, MemoryBackupStore::new(), RecordingObserver::default())
    }

    pub(crate) fn with_parts(
        backend: FakeBackend,
        backup: MemoryBackupStore,
        observer: RecordingObserver,
    ) -> Self {
        let backend = Arc::new(backend);
        let backup = Arc::new(backup);
        let observer = Arc::new(observer);

        let cart = Cart::new(
            backend.clone(),
            backup.clone(),
            observer.clone(),
            CartConfig::default(),
        );

        Self {
            cart,
            backend,
            backup,
            observer,
        }
    }
}

/// An INR line priced in major units.
pub(crate) fn line(cart_id: &str, product_id: &str, price: i64, quantity: u32) -> LineItem {
    LineItem::new(
        CartItemId::new(cart_id),
        ProductId::new(product_id),
        Money::from_minor(price * 100, INR),
        quantity,
    )
}

/// A backup holding `items`.
pub(crate) fn backup_of(items: &[LineItem]) -> MemoryBackupStore {
    MemoryBackupStore::with_snapshot(Snapshot::capture(items, &CartConfig::default()))
}
