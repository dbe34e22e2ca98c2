//! CLI configuration

use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};

use burka_cart::{
    api::DEFAULT_BASE_URL, checkout::CheckoutTimings, items::CartItemId, payment::PaymentMethod,
};

/// Burka cart
#[derive(Debug, Parser)]
#[command(name = "burka-cart", about = "Burka storefront cart", long_about = None)]
pub struct CartConfig {
    /// Storefront backend settings.
    #[command(flatten)]
    pub storefront: StorefrontConfig,

    /// Checkout timing settings.
    #[command(flatten)]
    pub checkout: CheckoutConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

impl CartConfig {
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
}

/// Storefront backend settings.
#[derive(Debug, Args)]
pub struct StorefrontConfig {
    /// Storefront API base URL
    #[arg(long, env = "STOREFRONT_API_URL", default_value = DEFAULT_BASE_URL)]
    pub api_url: String,

    /// HTTP request timeout in seconds
    #[arg(long, env = "STOREFRONT_HTTP_TIMEOUT_SECONDS", default_value_t = 10_u64)]
    pub http_timeout_seconds: u64,
}

impl StorefrontConfig {
    /// HTTP request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }
}

/// Checkout timing settings.
#[derive(Debug, Args)]
pub struct CheckoutConfig {
    /// Simulated payment processing time in milliseconds
    #[arg(long, env = "PAYMENT_DELAY_MS", default_value_t = 2_000_u64)]
    pub payment_delay_ms: u64,

    /// Pause after the cart is cleared before checkout finishes, in milliseconds
    #[arg(long, env = "CHECKOUT_SETTLE_DELAY_MS", default_value_t = 1_000_u64)]
    pub settle_delay_ms: u64,
}

impl CheckoutConfig {
    /// Simulated payment processing time.
    pub fn payment_delay(&self) -> Duration {
        Duration::from_millis(self.payment_delay_ms)
    }

    /// Delays handed to the cart page.
    pub fn timings(&self) -> CheckoutTimings {
        CheckoutTimings {
            settle_delay: Duration::from_millis(self.settle_delay_ms),
        }
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Cart commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the cart page.
    Show,

    /// Remove a line from the cart.
    Remove {
        /// Cart line id
        item: CartItemId,
    },

    /// Check out through a vendor and save the invoice.
    Checkout {
        /// Vendor id
        #[arg(long)]
        vendor: String,

        /// Quantity edits as `ITEM=QTY`
        #[arg(long = "quantity", value_parser = parse_quantity_edit)]
        quantities: Vec<(CartItemId, String)>,

        /// Payment methods as `ITEM=METHOD` (gpay, phonepay, card)
        #[arg(long = "payment", value_parser = parse_payment_choice)]
        payments: Vec<(CartItemId, PaymentMethod)>,

        /// Directory the invoice is written to
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

fn parse_quantity_edit(raw: &str) -> Result<(CartItemId, String), String> {
    match raw.split_once('=') {
        Some((item, quantity)) if !item.is_empty() => {
            Ok((CartItemId::new(item), quantity.trim().to_string()))
        }
        _ => Err(format!("expected ITEM=QTY, got '{raw}'")),
    }
}

fn parse_payment_choice(raw: &str) -> Result<(CartItemId, PaymentMethod), String> {
    match raw.split_once('=') {
        Some((item, method)) if !item.is_empty() => method
            .parse::<PaymentMethod>()
            .map(|method| (CartItemId::new(item), method))
            .map_err(|error| error.to_string()),
        _ => Err(format!("expected ITEM=METHOD, got '{raw}'")),
    }
}
