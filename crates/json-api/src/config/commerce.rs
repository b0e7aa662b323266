//! Commerce Config

use std::path::PathBuf;

use clap::Args;

/// Checkout and catalog settings.
#[derive(Debug, Args)]
pub struct CommerceConfig {
    /// Decimal places order totals are rounded to
    #[arg(long, env = "CURRENCY_PRECISION", default_value_t = 2_u32)]
    pub currency_precision: u32,

    /// Domain events buffered per subscriber
    #[arg(long, env = "EVENT_BUFFER", default_value_t = 1024_usize)]
    pub event_buffer: usize,

    /// YAML catalog seeded at startup
    #[arg(long, env = "CATALOG_FILE")]
    pub catalog_file: Option<PathBuf>,
}
