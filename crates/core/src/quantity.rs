//! Quantity policy
//!
//! Decides what a requested quantity change means before anything is sent to the backend.

use std::fmt;

use crate::{config::CartConfig, items::LineItem};

/// Why a quantity change was refused locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityRejection {
    /// More than the configured per-item maximum.
    ExceedsMaximum {
        /// Requested quantity.
        requested: u32,

        /// Configured maximum.
        maximum: u32,
    },

    /// More than the units in stock.
    ExceedsStock {
        /// Requested quantity.
        requested: u32,

        /// Units available.
        stock: u32,
    },
}

impl fmt::Display for QuantityRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExceedsMaximum { maximum, .. } => {
                write!(f, "Maximum {maximum} items allowed per product")
            }
            Self::ExceedsStock { stock, .. } => write!(f, "Only {stock} left in stock"),
        }
    }
}

/// Outcome of evaluating a requested quantity for a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityDecision {
    /// Zero or negative: the line should be removed.
    Remove,

    /// Refused locally; no backend call should be made.
    Reject(QuantityRejection),

    /// Same as the current quantity; nothing to do.
    Unchanged,

    /// Send this quantity to the backend.
    Set(u32),
}

/// Evaluate a requested quantity against the configured maximum and the line's stock.
///
/// Stock is only checked when the quantity goes up.
pub fn check_quantity(requested: i64, line: &LineItem, config: &CartConfig) -> QuantityDecision {
    let Ok(requested) = u32::try_from(requested) else {
        return if requested <= 0 {
            QuantityDecision::Remove
        } else {
            QuantityDecision::Reject(QuantityRejection::ExceedsMaximum {
                requested: u32::MAX,
                maximum: config.max_quantity_per_item(),
            })
        };
    };

    if requested == 0 {
        return QuantityDecision::Remove;
    }

    let maximum = config.max_quantity_per_item();

    if requested > maximum {
        return QuantityDecision::Reject(QuantityRejection::ExceedsMaximum { requested, maximum });
    }

    // Stock only caps increases; a line already over stock can still be lowered.
    if let Some(stock) = line
        .stock
        .filter(|stock| requested > line.quantity && requested > *stock)
    {
        return QuantityDecision::Reject(QuantityRejection::ExceedsStock { requested, stock });
    }

    if requested == line.quantity {
        return QuantityDecision::Unchanged;
    }

    QuantityDecision::Set(requested)
}
