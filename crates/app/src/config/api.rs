//! Storefront API Config

use clap::Args;

use crate::backend::{HttpCartBackend, HttpConfigError};

/// Storefront API settings.
#[derive(Debug, Args)]
pub struct ApiConfig {
    /// Base URL of the storefront API
    #[arg(
        long,
        env = "TROLLEY_API_URL",
        default_value = "http://localhost:5000/api"
    )]
    pub api_url: String,

    /// Bearer token sent with every request
    #[arg(long, env = "TROLLEY_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,
}

impl ApiConfig {
    /// Build the HTTP backend these settings describe.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the client cannot be built.
    pub fn backend(&self) -> Result<HttpCartBackend, HttpConfigError> {
        HttpCartBackend::new(&self.api_url, self.api_token.clone())
    }
}
