//! Trolley
//!
//! Trolley is the pricing and state core of a storefront shopping cart: line items, totals,
//! delivery thresholds and the normalization of backend cart payloads.
//!
//! Everything in this crate is pure and synchronous. Network access, persistence and user
//! notification live in `trolley-app`.

pub mod config;
pub mod discounts;
pub mod items;
pub mod money;
pub mod payload;
pub mod prelude;
pub mod quantity;
pub mod snapshot;
pub mod totals;
