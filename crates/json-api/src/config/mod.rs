//! Server configuration module

use std::net::SocketAddr;

use clap::Parser;

use storefront_app::context::CommerceSettings;

use crate::config::{
    commerce::CommerceConfig,
    observability::{LoggingConfig, ObservabilityConfig},
    operator::OperatorConfig,
    server::ServerRuntimeConfig,
};

pub(crate) mod commerce;
pub(crate) mod observability;
pub(crate) mod operator;
pub(crate) mod server;

/// Storefront JSON API Server configuration
#[derive(Debug, Parser)]
#[command(name = "storefront-json", about = "Storefront JSON API Server", long_about = None)]
pub struct ServerConfig {
    /// Server network settings.
    #[command(flatten)]
    pub server: ServerRuntimeConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Observability settings.
    #[command(flatten)]
    pub observability: ObservabilityConfig,

    /// Checkout and catalog settings.
    #[command(flatten)]
    pub commerce: CommerceConfig,

    /// Operator route settings.
    #[command(flatten)]
    pub operator: OperatorConfig,
}

impl ServerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Get the socket address for binding
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        self.server.socket_addr()
    }

    /// Settings handed to the application context.
    #[must_use]
    pub fn commerce_settings(&self) -> CommerceSettings {
        CommerceSettings {
            currency_precision: self.commerce.currency_precision,
            event_buffer: self.commerce.event_buffer,
            catalog_file: self.commerce.catalog_file.clone(),
        }
    }
}
