//! Burka cart CLI

use std::{
    io::{self, Write},
    process::ExitCode,
    sync::Arc,
};

use thiserror::Error;
use tracing::{error, info};

use burka_cart::{
    api::{ApiError, HttpStorefrontClient},
    checkout::CheckoutError,
    invoice::InvoiceError,
    items::CartItemId,
    page::{CartPage, CheckoutOutcome, LineError, RemoveOutcome},
    payment::{PaymentError, SimulatedGateway},
    pricing::PricingError,
    quantities::QuantityError,
    render::{RenderError, write_page},
    store::{CartStore, RemoteCartStore, StoreError},
    vendors::VendorId,
};

use crate::config::{CartConfig, Command};

mod config;
mod logging;

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Quantity(#[from] QuantityError),

    #[error(transparent)]
    Line(#[from] LineError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Invoice(#[from] InvoiceError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to write output")]
    Io(#[from] io::Error),

    #[error("cart item {0} is not in the cart")]
    NotInCart(CartItemId),

    #[error(transparent)]
    Declined(PaymentError),
}

/// Burka cart entry point
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = match CartConfig::load() {
        Ok(config) => config,
        Err(error) => {
            // Also covers --help and --version, which clap reports as errors
            _ = error.print();

            return if error.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(error) = logging::init_subscriber(&config.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialise, must use eprintln"
        )]
        {
            eprintln!("Logging error: {error}");
        }

        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(%error, "burka-cart failed");

            ExitCode::FAILURE
        }
    }
}

async fn run(config: CartConfig) -> Result<(), CliError> {
    let api = Arc::new(HttpStorefrontClient::with_base_url(
        &config.storefront.api_url,
        config.storefront.timeout(),
    )?);

    info!(base_url = %api.base_url(), "using storefront");

    let store = Arc::new(RemoteCartStore::new(api.clone()));

    store.refresh().await?;

    let page = CartPage::new(
        store,
        api,
        Arc::new(SimulatedGateway::new(config.checkout.payment_delay())),
        config.checkout.timings(),
    );

    page.mount().await;

    let mut invoice_text = None;

    match config.command {
        Command::Show => {}
        Command::Remove { item } => {
            let outcome = page.remove_item(&item).await;

            if outcome == RemoveOutcome::NotInCart {
                return Err(CliError::NotInCart(item));
            }

            info!(?outcome, %item, "remove finished");
        }
        Command::Checkout {
            vendor,
            quantities,
            payments,
            out,
        } => {
            for (item, quantity) in &quantities {
                page.enter_quantity(item, quantity)?;
            }

            for (item, method) in payments {
                page.select_payment_method(&item, Some(method))?;
            }

            page.select_vendor(Some(VendorId::new(vendor)));
            page.open_checkout()?;

            match page.confirm_payment().await? {
                CheckoutOutcome::Completed {
                    receipt,
                    failed_removals,
                } => {
                    let path = page.download_invoice(&out)?;

                    info!(
                        reference = %receipt.reference,
                        failed_removals = failed_removals.len(),
                        path = %path.display(),
                        "checkout complete"
                    );

                    invoice_text = page.invoice().map(|invoice| invoice.to_text());
                }
                CheckoutOutcome::Declined(error) => return Err(CliError::Declined(error)),
            }
        }
    }

    let mut out = io::stdout().lock();

    write_page(&mut out, &page.view()?)?;

    if let Some(text) = invoice_text {
        writeln!(out, "\n{text}")?;
    }

    Ok(())
}
