//! Cart observer
//!
//! The cart never talks to a user directly. Everything it wants shown, asked or re-rendered goes
//! through a [`CartObserver`].

use std::fmt;

use mockall::automock;
use tracing::{error, info, warn};
use trolley::{
    items::{CartItemId, LineItem},
    quantity::QuantityRejection,
};

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// An operation completed.
    Success,

    /// Neutral information.
    Info,

    /// The request was not carried out, or only partly.
    Warning,

    /// The request failed.
    Error,
}

/// A cart mutation, as named in failure notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Adding a product.
    AddItem,

    /// Removing a line.
    RemoveItem,

    /// Changing a line's quantity.
    UpdateQuantity,

    /// Emptying the cart.
    Clear,

    /// Applying a promo code.
    ApplyPromo,

    /// Removing a promo code.
    RemovePromo,
}

impl Action {
    /// Message shown when the backend gives no better one.
    pub fn fallback_message(self) -> &'static str {
        match self {
            Self::AddItem => "Failed to add item to cart",
            Self::RemoveItem => "Failed to remove item",
            Self::UpdateQuantity => "Failed to update quantity",
            Self::Clear => "Failed to clear cart",
            Self::ApplyPromo => "Failed to apply promo code",
            Self::RemovePromo => "Failed to remove promo code",
        }
    }
}

/// Something the user should be told.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A product was added.
    ItemAdded,

    /// A line was removed.
    ItemRemoved,

    /// A line's quantity was changed.
    QuantityUpdated {
        /// New quantity.
        quantity: u32,
    },

    /// The cart was emptied.
    CartCleared,

    /// A promo code was applied.
    PromoApplied {
        /// The code.
        code: String,
    },

    /// A promo code was removed.
    PromoRemoved {
        /// The code.
        code: String,
    },

    /// The backend was unreachable and the cart was restored from the local backup.
    DegradedMode,

    /// The backend needs the user to sign in.
    SignInRequired,

    /// The cart could not be loaded and there was nothing to fall back on.
    LoadFailed,

    /// A quantity change was refused locally.
    QuantityRejected(QuantityRejection),

    /// The line is not in the cart.
    ItemNotFound(CartItemId),

    /// The promo code was blank.
    InvalidPromoCode,

    /// A backend mutation failed.
    OperationFailed {
        /// What was attempted.
        action: Action,

        /// Message for the user.
        message: String,
    },
}

impl Notice {
    /// Severity of the notice.
    pub fn level(&self) -> NoticeLevel {
        match self {
            Self::ItemAdded
            | Self::ItemRemoved
            | Self::QuantityUpdated { .. }
            | Self::CartCleared
            | Self::PromoApplied { .. } => NoticeLevel::Success,
            Self::PromoRemoved { .. } => NoticeLevel::Info,
            Self::DegradedMode
            | Self::SignInRequired
            | Self::QuantityRejected(_)
            | Self::ItemNotFound(_)
            | Self::InvalidPromoCode => NoticeLevel::Warning,
            Self::LoadFailed | Self::OperationFailed { .. } => NoticeLevel::Error,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ItemAdded => f.write_str("Item added to cart"),
            Self::ItemRemoved => f.write_str("Item removed from cart"),
            Self::QuantityUpdated { quantity } => write!(f, "Quantity updated to {quantity}"),
            Self::CartCleared => f.write_str("Cart cleared"),
            Self::PromoApplied { code } => write!(f, "Promo code {code} applied"),
            Self::PromoRemoved { code } => write!(f, "Promo code {code} removed"),
            Self::DegradedMode => f.write_str("Showing your saved cart while we reconnect"),
            Self::SignInRequired => f.write_str("Please sign in to view your cart"),
            Self::LoadFailed => f.write_str("Failed to load cart"),
            Self::QuantityRejected(rejection) => fmt::Display::fmt(rejection, f),
            Self::ItemNotFound(_) => f.write_str("Item not found in cart"),
            Self::InvalidPromoCode => f.write_str("Please enter a promo code"),
            Self::OperationFailed { message, .. } => f.write_str(message),
        }
    }
}

/// A question the user must answer before the cart proceeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Remove every line from the cart.
    ClearCart,
}

impl fmt::Display for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClearCart => f.write_str("Are you sure you want to clear your cart?"),
        }
    }
}

/// Receives everything the cart wants to show or ask.
#[automock]
pub trait CartObserver: Send + Sync {
    /// Show a notice.
    fn notify(&self, notice: &Notice);

    /// Ask the user a question. `false` aborts the operation.
    fn confirm(&self, confirmation: &Confirmation) -> bool;

    /// The cart contents changed, or must be re-rendered.
    fn cart_updated(&self, items: &[LineItem]);
}

/// Observer that writes notices to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver {
    auto_confirm: bool,
}

impl TracingObserver {
    /// Create an observer answering every confirmation with `auto_confirm`.
    pub fn new(auto_confirm: bool) -> Self {
        Self { auto_confirm }
    }
}

impl CartObserver for TracingObserver {
    fn notify(&self, notice: &Notice) {
        match notice.level() {
            NoticeLevel::Success | NoticeLevel::Info => info!(%notice, "cart notice"),
            NoticeLevel::Warning => warn!(%notice, "cart notice"),
            NoticeLevel::Error => error!(%notice, "cart notice"),
        }
    }

    fn confirm(&self, confirmation: &Confirmation) -> bool {
        info!(%confirmation, answer = self.auto_confirm, "cart confirmation");

        self.auto_confirm
    }

    fn cart_updated(&self, items: &[LineItem]) {
        info!(lines = items.len(), "cart updated");
    }
}
