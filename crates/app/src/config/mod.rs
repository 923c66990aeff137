//! Client configuration

use clap::Args;

use crate::config::{api::ApiConfig, cart::CartSettings, logging::LoggingConfig};

pub mod api;
pub mod cart;
pub mod logging;

/// Trolley client configuration, read from arguments, the environment and `.env`.
#[derive(Debug, Args)]
pub struct ClientConfig {
    /// Storefront API settings.
    #[command(flatten)]
    pub api: ApiConfig,

    /// Cart rules and client behaviour.
    #[command(flatten)]
    pub cart: CartSettings,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}
