//! Cart aggregate
//!
//! [`Cart`] owns the client-side copy of the shopper's cart. The backend stays authoritative:
//! every mutation is sent first and followed by a full reload, and the local list is only ever
//! replaced wholesale by what the backend (or, when it is unreachable, the local backup) says.

use std::{
    fmt,
    future::Future,
    sync::{
        Arc, PoisonError, RwLock,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tracing::{debug, info, warn};
use trolley::{
    config::CartConfig,
    items::{CartItemId, LineItem, ProductId, Variant, find_line},
    payload::normalize_items,
    quantity::{QuantityDecision, QuantityRejection, check_quantity},
    snapshot::Snapshot,
    totals::{Totals, TotalsError, calculate_totals},
};

use crate::{
    backend::{BackendError, CartBackend, NewCartItem},
    backup::BackupStore,
    debounce::Debouncer,
    observer::{Action, CartObserver, Confirmation, Notice},
    retry::RetryPolicy,
};

/// Outcome of [`Cart::update_quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityUpdate {
    /// A later request for the same line replaced this one.
    Superseded,

    /// The backend accepted the new quantity.
    Updated(u32),

    /// The requested quantity was zero or negative and the line was removed.
    Removed,

    /// Refused locally; nothing was sent.
    Rejected(QuantityRejection),

    /// Already at the requested quantity; nothing was sent.
    Unchanged,

    /// The line is not in the cart; nothing was sent.
    NotFound,

    /// The backend refused or could not be reached.
    Failed,
}

/// Client-side cart.
pub struct Cart {
    backend: Arc<dyn CartBackend>,
    backup: Arc<dyn BackupStore>,
    observer: Arc<dyn CartObserver>,
    config: CartConfig,
    retry: RetryPolicy,
    debouncer: Debouncer<CartItemId>,
    items: RwLock<Vec<LineItem>>,
    loading: AtomicBool,
}

impl fmt::Debug for Cart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cart")
            .field("config", &self.config)
            .field("retry", &self.retry)
            .field("debouncer", &self.debouncer)
            .field("items", &self.items)
            .field("loading", &self.loading)
            .finish_non_exhaustive()
    }
}

/// Marks a load as in flight for as long as it lives.
struct LoadGuard<'a>(&'a AtomicBool);

impl<'a> LoadGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Cart {
    /// Create an empty cart. Call [`Cart::load`] to fetch its contents.
    pub fn new(
        backend: Arc<dyn CartBackend>,
        backup: Arc<dyn BackupStore>,
        observer: Arc<dyn CartObserver>,
        config: CartConfig,
    ) -> Self {
        Self {
            backend,
            backup,
            observer,
            config,
            retry: RetryPolicy::default(),
            debouncer: Debouncer::default(),
            items: RwLock::new(Vec::new()),
            loading: AtomicBool::new(false),
        }
    }

    /// Use `retry` for loads.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Debounce quantity changes over `window`.
    #[must_use]
    pub fn with_debounce_window(mut self, window: Duration) -> Self {
        self.debouncer = Debouncer::new(window);
        self
    }

    /// Cart configuration.
    pub fn config(&self) -> &CartConfig {
        &self.config
    }

    /// Copy of the current line items.
    pub fn items(&self) -> Vec<LineItem> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Totals of the current line items.
    ///
    /// # Errors
    ///
    /// Returns a [`TotalsError`] if the items cannot be summed.
    pub fn totals(&self) -> Result<Totals, TotalsError> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);

        calculate_totals(&items, &self.config)
    }

    /// Fetch the cart from the backend and replace the local list with it.
    ///
    /// A call made while another load is running returns the current list without a request.
    /// When the backend cannot be reached the local backup stands in; when there is none the
    /// cart is emptied. Either way the resulting list is returned.
    #[tracing::instrument(skip(self))]
    pub async fn load(&self) -> Vec<LineItem> {
        let Some(_guard) = LoadGuard::acquire(&self.loading) else {
            debug!("cart load already in flight");

            return self.items();
        };

        match self.retry.run(|| self.backend.fetch_cart()).await {
            Ok(data) => {
                let items = normalize_items(data.into_entries(), &self.config);

                info!(lines = items.len(), "cart loaded");

                self.save_backup(&items);
                self.publish(items)
            }
            Err(error) => self.recover(&error),
        }
    }

    /// Add `quantity` units of a product. The backend merges it with any matching line.
    ///
    /// Returns whether the backend accepted the item. The cart is reloaded either way.
    #[tracing::instrument(skip_all, fields(product_id = %product_id, quantity = quantity))]
    pub async fn add_item(
        &self,
        product_id: ProductId,
        quantity: u32,
        variant: Option<Variant>,
    ) -> bool {
        let request = NewCartItem {
            product_id,
            quantity: quantity.max(1),
            variant,
        };

        self.mutate(
            Action::AddItem,
            self.backend.add_item(request),
            Notice::ItemAdded,
        )
        .await
    }

    /// Remove a line.
    ///
    /// Returns whether the backend removed it. Unknown lines are reported without a request.
    #[tracing::instrument(skip_all, fields(cart_id = %cart_id))]
    pub async fn remove_item(&self, cart_id: &CartItemId) -> bool {
        if self.find(cart_id).is_none() {
            warn!("line not in cart");
            self.observer.notify(&Notice::ItemNotFound(cart_id.clone()));

            return false;
        }

        self.mutate(
            Action::RemoveItem,
            self.backend.remove_item(cart_id.clone()),
            Notice::ItemRemoved,
        )
        .await
    }

    /// Change a line's quantity.
    ///
    /// Requests for the same line are debounced; only the last one in a burst is acted on. Zero
    /// or less removes the line, and quantities over the per-item maximum or the known stock are
    /// refused without contacting the backend.
    #[tracing::instrument(skip_all, fields(cart_id = %cart_id, quantity = quantity))]
    pub async fn update_quantity(&self, cart_id: &CartItemId, quantity: i64) -> QuantityUpdate {
        if !self.debouncer.settle(cart_id.clone()).await {
            debug!("superseded by a later quantity change");

            return QuantityUpdate::Superseded;
        }

        let Some(line) = self.find(cart_id) else {
            warn!("line not in cart");
            self.observer.notify(&Notice::ItemNotFound(cart_id.clone()));

            return QuantityUpdate::NotFound;
        };

        match check_quantity(quantity, &line, &self.config) {
            QuantityDecision::Remove => {
                if self.remove_item(cart_id).await {
                    QuantityUpdate::Removed
                } else {
                    QuantityUpdate::Failed
                }
            }
            QuantityDecision::Reject(rejection) => {
                warn!(%rejection, "quantity refused");

                self.observer.notify(&Notice::QuantityRejected(rejection));
                self.observer.cart_updated(&self.items());

                QuantityUpdate::Rejected(rejection)
            }
            QuantityDecision::Unchanged => QuantityUpdate::Unchanged,
            QuantityDecision::Set(quantity) => {
                let accepted = self
                    .mutate(
                        Action::UpdateQuantity,
                        self.backend.update_quantity(cart_id.clone(), quantity),
                        Notice::QuantityUpdated { quantity },
                    )
                    .await;

                if accepted {
                    QuantityUpdate::Updated(quantity)
                } else {
                    QuantityUpdate::Failed
                }
            }
        }
    }

    /// Empty the cart once the observer confirms.
    ///
    /// Returns whether the cart was cleared. A declined confirmation sends nothing.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self) -> bool {
        if !self.observer.confirm(&Confirmation::ClearCart) {
            debug!("clear declined");

            return false;
        }

        self.mutate(Action::Clear, self.backend.clear(), Notice::CartCleared)
            .await
    }

    /// Apply a promo code. Discounts are worked out by the backend and arrive with the reload.
    #[tracing::instrument(skip(self))]
    pub async fn apply_promo_code(&self, code: &str) -> bool {
        let Some(code) = promo_code(code) else {
            self.observer.notify(&Notice::InvalidPromoCode);

            return false;
        };

        self.mutate(
            Action::ApplyPromo,
            self.backend.apply_coupon(code.clone()),
            Notice::PromoApplied { code },
        )
        .await
    }

    /// Remove a promo code.
    #[tracing::instrument(skip(self))]
    pub async fn remove_promo_code(&self, code: &str) -> bool {
        let Some(code) = promo_code(code) else {
            self.observer.notify(&Notice::InvalidPromoCode);

            return false;
        };

        self.mutate(
            Action::RemovePromo,
            self.backend.remove_coupon(code.clone()),
            Notice::PromoRemoved { code },
        )
        .await
    }

    fn find(&self, cart_id: &CartItemId) -> Option<LineItem> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);

        find_line(&items, cart_id).cloned()
    }

    /// Replace the local list and tell the observer.
    fn publish(&self, items: Vec<LineItem>) -> Vec<LineItem> {
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clone_from(&items);

        // The lock is released before the observer runs so it can read the cart back.
        self.observer.cart_updated(&items);

        items
    }

    /// Send a mutation, report its outcome and resync with the backend.
    async fn mutate(
        &self,
        action: Action,
        request: impl Future<Output = Result<(), BackendError>>,
        success: Notice,
    ) -> bool {
        let accepted = match request.await {
            Ok(()) => {
                self.observer.notify(&success);

                true
            }
            Err(error) => {
                debug!(?action, %error, "cart mutation failed");

                self.observer.notify(&Notice::OperationFailed {
                    action,
                    message: error.user_message(action.fallback_message()),
                });

                false
            }
        };

        self.load().await;

        accepted
    }

    fn recover(&self, error: &BackendError) -> Vec<LineItem> {
        warn!(%error, "cart load failed");

        if let Some(items) = self.restore_backup() {
            info!(lines = items.len(), "restored cart from backup");

            let items = self.publish(items);
            self.observer.notify(&Notice::DegradedMode);

            return items;
        }

        let items = self.publish(Vec::new());

        if error.is_unauthorized() {
            self.observer.notify(&Notice::SignInRequired);
        } else {
            self.observer.notify(&Notice::LoadFailed);
        }

        items
    }

    fn restore_backup(&self) -> Option<Vec<LineItem>> {
        let snapshot = match self.backup.load() {
            Ok(snapshot) => snapshot?,
            Err(error) => {
                warn!(%error, "ignoring unreadable cart backup");

                return None;
            }
        };

        match snapshot.restore(&self.config) {
            Ok(items) if !items.is_empty() => Some(items),
            Ok(_) => None,
            Err(error) => {
                warn!(%error, "ignoring cart backup");

                None
            }
        }
    }

    fn save_backup(&self, items: &[LineItem]) {
        if let Err(error) = self.backup.save(&Snapshot::capture(items, &self.config)) {
            warn!(%error, "failed to save cart backup");
        }
    }
}

fn promo_code(code: &str) -> Option<String> {
    let code = code.trim();

    (!code.is_empty()).then(|| code.to_string())
}
