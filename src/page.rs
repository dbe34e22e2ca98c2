//! Cart Page
//!
//! [`CartPage`] is the headless controller behind the cart screen. UI callbacks map onto its
//! methods and [`CartPage::view`] produces what the screen should show.
//!
//! The cart itself lives in a [`CartStore`] owned elsewhere; the page keeps only its own state:
//! edited quantities, vendors, the selected vendor, in-flight removals, the checkout state and a
//! single error slot. That state sits behind a mutex which is never held across an `.await`, so
//! concurrent callbacks see each other's flags.
//!
//! Failures never propagate past the page. They are logged, the error slot is set to a generic
//! message (the most recent one wins) and the page carries on. Nothing is retried.

use std::{
    num::NonZeroU32,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use futures::future::join_all;
use rust_decimal::Decimal;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    api::StorefrontApi,
    checkout::{CheckoutAction, CheckoutError, CheckoutState, CheckoutTimings},
    invoice::{Invoice, InvoiceError},
    items::{CartItem, CartItemId},
    order::Order,
    payment::{PaymentError, PaymentGateway, PaymentMethod, PaymentReceipt},
    pricing::{PricingError, Totals},
    products::ProductId,
    quantities::{EditedQuantities, QuantityError},
    store::CartStore,
    vendors::{Vendor, VendorId, discount_points_for, find_vendor},
    view::{CartPageView, ViewContext},
};

/// Messages shown in the page's error slot.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum PageError {
    /// The vendor list couldn't be fetched.
    #[error("Failed to load vendors.")]
    LoadVendors,

    /// A cart line couldn't be removed.
    #[error("Failed to delete.")]
    Delete,

    /// The payment was not approved.
    #[error("Payment failed.")]
    Payment,

    /// The cart store couldn't be refreshed.
    #[error("Failed to refresh cart.")]
    RefreshCart,

    /// Some lines stayed in the cart after a successful payment.
    #[error("Some items could not be removed from the cart.")]
    ClearCart,

    /// The invoice was requested before checkout finished.
    #[error("Invoice is not available yet.")]
    InvoiceUnavailable,

    /// Totals couldn't be calculated.
    #[error("Failed to calculate totals.")]
    Pricing,
}

/// Errors editing a single cart line.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LineError {
    /// The line isn't in the cart.
    #[error("cart item {0} is not in the cart")]
    NotInCart(CartItemId),

    /// The line is being removed, so its controls are disabled.
    #[error("cart item {0} is being removed")]
    Removing(CartItemId),
}

/// Result of removing a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The line was removed and the cart refreshed.
    Removed,

    /// The backend refused; the line stays.
    Failed,

    /// A removal for this line is already running; no request was sent.
    AlreadyInFlight,

    /// The line isn't in the cart.
    NotInCart,
}

/// Result of confirming the payment.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutOutcome {
    /// Payment approved and checkout done.
    Completed {
        /// Gateway receipt
        receipt: PaymentReceipt,

        /// Products whose removal from the cart failed
        failed_removals: SmallVec<[ProductId; 4]>,
    },

    /// Payment declined; the modal is open again.
    Declined(PaymentError),
}

#[derive(Debug, Default)]
struct PageState {
    quantities: EditedQuantities,
    vendors: Vec<Vendor>,
    selected_vendor: Option<VendorId>,
    loading: bool,
    error: Option<PageError>,
    removing: FxHashSet<CartItemId>,
    payment_methods: FxHashMap<CartItemId, PaymentMethod>,
    checkout: CheckoutState,
    confirmed_order: Option<Order>,
    invoice: Option<Invoice>,
}

impl PageState {
    fn discount_points(&self) -> Decimal {
        discount_points_for(&self.vendors, self.selected_vendor.as_ref())
    }

    fn price(&self, items: &[CartItem]) -> Result<Order, PricingError> {
        Order::price(
            items,
            &self.quantities,
            self.selected_vendor.clone(),
            self.discount_points(),
        )
    }
}

/// Cart page controller.
pub struct CartPage {
    store: Arc<dyn CartStore>,
    api: Arc<dyn StorefrontApi>,
    gateway: Arc<dyn PaymentGateway>,
    timings: CheckoutTimings,
    state: Mutex<PageState>,
}

impl std::fmt::Debug for CartPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartPage")
            .field("timings", &self.timings)
            .field("state", &*self.state())
            .finish_non_exhaustive()
    }
}

impl CartPage {
    /// Create a page over the shared cart store.
    pub fn new(
        store: Arc<dyn CartStore>,
        api: Arc<dyn StorefrontApi>,
        gateway: Arc<dyn PaymentGateway>,
        timings: CheckoutTimings,
    ) -> Self {
        let quantities = EditedQuantities::from_items(&store.list());

        Self {
            store,
            api,
            gateway,
            timings,
            state: Mutex::new(PageState {
                quantities,
                ..PageState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current cart lines plus the page state, reconciled with each other.
    fn synced(&self) -> (Vec<CartItem>, MutexGuard<'_, PageState>) {
        let items = self.store.list();
        let mut state = self.state();

        if state.quantities.reconcile(&items) {
            debug!(lines = items.len(), "re-derived edited quantities");
        }

        state
            .payment_methods
            .retain(|id, _method| items.iter().any(|item| &item.id == id));

        (items, state)
    }

    /// Load vendors and sync with the cart store.
    ///
    /// A failed vendor fetch leaves the list empty and sets the error slot.
    #[tracing::instrument(skip_all)]
    pub async fn mount(&self) {
        self.state().loading = true;

        let vendors = self.api.list_vendors().await;

        {
            let mut state = self.state();

            state.loading = false;

            match vendors {
                Ok(vendors) => {
                    info!(count = vendors.len(), "loaded vendors");
                    state.vendors = vendors;
                }
                Err(error) => {
                    warn!(%error, "failed to load vendors");
                    state.vendors.clear();
                    state.error = Some(PageError::LoadVendors);
                }
            }
        }

        self.sync_cart();
    }

    /// Reconcile edited quantities with the store.
    ///
    /// Returns `true` if the store's line ids changed and quantities were re-derived.
    pub fn sync_cart(&self) -> bool {
        let items = self.store.list();

        self.state().quantities.reconcile(&items)
    }

    /// Current cart lines.
    pub fn items(&self) -> Vec<CartItem> {
        self.store.list()
    }

    /// Edited quantity of a line.
    pub fn quantity(&self, id: &CartItemId) -> Option<NonZeroU32> {
        self.synced().1.quantities.get(id)
    }

    /// Add one to a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::UnknownItem`] if the line isn't in the cart.
    pub fn increment(&self, id: &CartItemId) -> Result<NonZeroU32, QuantityError> {
        self.synced().1.quantities.increment(id)
    }

    /// Take one from a line's quantity. Does nothing at 1.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::UnknownItem`] if the line isn't in the cart.
    pub fn decrement(&self, id: &CartItemId) -> Result<NonZeroU32, QuantityError> {
        self.synced().1.quantities.decrement(id)
    }

    /// Apply typed quantity input. See [`EditedQuantities::enter`] for how it is parsed.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::UnknownItem`] if the line isn't in the cart.
    pub fn enter_quantity(
        &self,
        id: &CartItemId,
        input: &str,
    ) -> Result<NonZeroU32, QuantityError> {
        self.synced().1.quantities.enter(id, input)
    }

    /// Mark a line with a payment method, or clear it with `None`.
    ///
    /// # Errors
    ///
    /// - [`LineError::NotInCart`] if the line isn't in the cart.
    /// - [`LineError::Removing`] while the line is being removed.
    pub fn select_payment_method(
        &self,
        id: &CartItemId,
        method: Option<PaymentMethod>,
    ) -> Result<(), LineError> {
        let (items, mut state) = self.synced();

        if !items.iter().any(|item| &item.id == id) {
            return Err(LineError::NotInCart(id.clone()));
        }

        if state.removing.contains(id) {
            return Err(LineError::Removing(id.clone()));
        }

        debug!(%id, ?method, "payment method selected");

        match method {
            Some(method) => state.payment_methods.insert(id.clone(), method),
            None => state.payment_methods.remove(id),
        };

        Ok(())
    }

    /// Payment method a line is marked with.
    pub fn payment_method(&self, id: &CartItemId) -> Option<PaymentMethod> {
        self.synced().1.payment_methods.get(id).copied()
    }

    /// Select a vendor, or clear the selection with `None`.
    ///
    /// Returns the discount now applied, in percent points.
    pub fn select_vendor(&self, vendor: Option<VendorId>) -> Decimal {
        let mut state = self.state();

        state.selected_vendor = vendor;

        let points = state.discount_points();

        debug!(vendor = ?state.selected_vendor, %points, "vendor selected");

        points
    }

    /// Selected vendor.
    pub fn selected_vendor(&self) -> Option<VendorId> {
        self.state().selected_vendor.clone()
    }

    /// Loaded vendors.
    pub fn vendors(&self) -> Vec<Vendor> {
        self.state().vendors.clone()
    }

    /// Discount of the selected vendor in percent points.
    pub fn discount_points(&self) -> Decimal {
        self.state().discount_points()
    }

    /// The cart priced with edited quantities and the vendor discount.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the totals can't be represented.
    pub fn order(&self) -> Result<Order, PricingError> {
        let (items, state) = self.synced();

        state.price(&items)
    }

    /// Subtotal, discount and total.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the totals can't be represented.
    pub fn totals(&self) -> Result<Totals, PricingError> {
        self.order().map(|order| *order.totals())
    }

    /// Whether vendors are still loading.
    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    /// Current error slot.
    pub fn error(&self) -> Option<PageError> {
        self.state().error
    }

    /// Current checkout state.
    pub fn checkout_state(&self) -> CheckoutState {
        self.state().checkout
    }

    /// Remove a cart line from the backend and refresh the store.
    ///
    /// The line is marked as being removed until the request settles. A second call while the
    /// first is running sends nothing.
    #[tracing::instrument(skip_all, fields(item = %id))]
    pub async fn remove_item(&self, id: &CartItemId) -> RemoveOutcome {
        let product = {
            let (items, mut state) = self.synced();

            let Some(item) = items.iter().find(|item| &item.id == id) else {
                return RemoveOutcome::NotInCart;
            };

            if !state.removing.insert(id.clone()) {
                debug!("removal already in flight");
                return RemoveOutcome::AlreadyInFlight;
            }

            item.product.id.clone()
        };

        let outcome = match self.api.remove_cart_item(&product).await {
            Ok(()) => {
                info!(%product, "removed cart item");

                if let Err(error) = self.store.refresh().await {
                    warn!(%error, "failed to refresh cart after removal");
                    self.state().error = Some(PageError::RefreshCart);
                }

                RemoveOutcome::Removed
            }
            Err(error) => {
                warn!(%error, %product, "failed to remove cart item");
                self.state().error = Some(PageError::Delete);

                RemoveOutcome::Failed
            }
        };

        self.synced().1.removing.remove(id);

        outcome
    }

    /// Open the checkout modal.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::VendorRequired`] if no vendor is selected.
    /// - [`CheckoutError::UnknownVendor`] if the selected vendor isn't in the loaded list.
    /// - [`CheckoutError::EmptyCart`] if the cart has no lines.
    /// - [`CheckoutError::InvalidTransition`] if the modal is already open or checkout is done.
    pub fn open_checkout(&self) -> Result<(), CheckoutError> {
        let (items, mut state) = self.synced();

        let Some(vendor) = state.selected_vendor.as_ref() else {
            return Err(CheckoutError::VendorRequired);
        };

        if find_vendor(&state.vendors, vendor).is_none() {
            return Err(CheckoutError::UnknownVendor(vendor.clone()));
        }

        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        state.checkout = state.checkout.apply(CheckoutAction::Open)?;

        Ok(())
    }

    /// Cancel the checkout modal. Only allowed before payment is confirmed.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] unless the modal is open and idle.
    pub fn close_checkout(&self) -> Result<(), CheckoutError> {
        let mut state = self.state();

        state.checkout = state.checkout.apply(CheckoutAction::Close)?;

        Ok(())
    }

    /// Confirm the payment and finish checkout.
    ///
    /// Charges the order, captures the invoice, removes every line from the cart concurrently,
    /// refreshes the store, waits the settle delay and marks checkout done. Removal failures are
    /// reported in the outcome but not rolled back.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::InvalidTransition`] if the modal isn't open and idle.
    /// - [`CheckoutError::Pricing`] if the order can't be priced.
    #[tracing::instrument(skip_all)]
    pub async fn confirm_payment(&self) -> Result<CheckoutOutcome, CheckoutError> {
        let order = {
            let (items, mut state) = self.synced();
            let processing = state.checkout.apply(CheckoutAction::Confirm)?;

            let order = match state.price(&items) {
                Ok(order) => order,
                Err(error) => {
                    warn!(%error, "failed to price order");
                    state.error = Some(PageError::Pricing);

                    return Err(error.into());
                }
            };

            state.checkout = processing;
            state.error = None;
            state.confirmed_order = Some(order.clone());

            order
        };

        let receipt = match self.gateway.charge(&order).await {
            Ok(receipt) => receipt,
            Err(error) => {
                warn!(%error, "payment failed");

                let mut state = self.state();

                state.checkout = state.checkout.apply(CheckoutAction::Decline)?;
                state.confirmed_order = None;
                state.error = Some(PageError::Payment);

                return Ok(CheckoutOutcome::Declined(error));
            }
        };

        {
            let mut state = self.state();

            state.checkout = state.checkout.apply(CheckoutAction::Approve)?;
            state.invoice = Some(Invoice::from_order(&order));
        }

        let failed_removals = self.clear_cart(&order).await;

        if !failed_removals.is_empty() {
            self.state().error = Some(PageError::ClearCart);
        }

        if let Err(error) = self.store.refresh().await {
            warn!(%error, "failed to refresh cart after checkout");
            self.state().error = Some(PageError::RefreshCart);
        }

        tokio::time::sleep(self.timings.settle_delay).await;

        {
            let (_, mut state) = self.synced();

            state.checkout = state.checkout.apply(CheckoutAction::Finish)?;
            state.confirmed_order = None;
        }

        info!(
            reference = %receipt.reference,
            total = %receipt.amount,
            failed_removals = failed_removals.len(),
            "checkout done"
        );

        Ok(CheckoutOutcome::Completed {
            receipt,
            failed_removals,
        })
    }

    async fn clear_cart(&self, order: &Order) -> SmallVec<[ProductId; 4]> {
        let api = &self.api;

        let results = join_all(order.lines().iter().map(|line| async move {
            (&line.product, api.remove_cart_item(&line.product).await)
        }))
        .await;

        results
            .into_iter()
            .filter_map(|(product, result)| match result {
                Ok(()) => None,
                Err(error) => {
                    warn!(%error, %product, "failed to remove cart item after payment");
                    Some(product.clone())
                }
            })
            .collect()
    }

    /// Invoice captured when the payment succeeded.
    pub fn invoice(&self) -> Option<Invoice> {
        self.state().invoice.clone()
    }

    /// Write the invoice PDF into `dir`.
    ///
    /// # Errors
    ///
    /// - [`InvoiceError::NotReady`] before checkout is done; the error slot is set too.
    /// - [`InvoiceError::Pdf`] or [`InvoiceError::Io`] if the file can't be produced.
    pub fn download_invoice(&self, dir: &Path) -> Result<PathBuf, InvoiceError> {
        let invoice = {
            let mut state = self.state();

            match (state.checkout.is_done(), state.invoice.clone()) {
                (true, Some(invoice)) => invoice,
                _ => {
                    state.error = Some(PageError::InvoiceUnavailable);

                    return Err(InvoiceError::NotReady);
                }
            }
        };

        invoice.save(dir).inspect_err(|error| {
            warn!(%error, "failed to save invoice");
        })
    }

    /// Build the render model.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the totals can't be represented; the error slot is set too.
    pub fn view(&self) -> Result<CartPageView, PricingError> {
        let (items, mut state) = self.synced();

        let order = match state.price(&items) {
            Ok(order) => order,
            Err(error) => {
                warn!(%error, "failed to price cart");
                state.error = Some(PageError::Pricing);

                return Err(error);
            }
        };

        let error = state.error.map(|error| error.to_string());

        Ok(CartPageView::build(&ViewContext {
            items: &items,
            order: &order,
            confirmed_order: state.confirmed_order.as_ref(),
            vendors: &state.vendors,
            selected_vendor: state.selected_vendor.as_ref(),
            removing: &state.removing,
            payment_methods: &state.payment_methods,
            checkout: state.checkout,
            error,
            loading: state.loading,
        }))
    }
}
