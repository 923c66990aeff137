//! Trolley cart client.
//!
//! Keeps a local view of a storefront cart in step with the cart API: loading with retry and
//! an offline backup, debounced quantity edits, promo codes and user notices.

pub mod backend;
pub mod backup;
pub mod cart;
pub mod config;
pub mod debounce;
pub mod observability;
pub mod observer;
pub mod render;
pub mod retry;

#[cfg(test)]
mod test;
