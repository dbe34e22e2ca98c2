//! Cart Page View
//!
//! Render model for the cart page. Built fresh from the page state on every call and never
//! cached; everything the screen shows, including labels and enabled flags, is decided here.

use rust_decimal::Decimal;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    checkout::CheckoutState,
    items::{CartItem, CartItemId},
    money::format_rupees,
    order::Order,
    payment::PaymentMethod,
    pricing::Totals,
    vendors::{Vendor, VendorId, find_vendor, format_points},
};

/// Page heading.
pub const PAGE_TITLE: &str = "Your Shopping Cart";

/// Placeholder option of the vendor selector.
pub const VENDOR_PLACEHOLDER: &str = "Select a vendor";

/// Placeholder option of the per-line payment selector.
pub const PAYMENT_PLACEHOLDER: &str = "Payment";

/// Empty cart heading.
pub const EMPTY_TITLE: &str = "Your cart is empty";

/// Empty cart hint.
pub const EMPTY_HINT: &str = "Add some products to get started";

/// Empty cart action.
pub const CONTINUE_SHOPPING: &str = "Continue Shopping";

/// Everything the cart page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartPageView {
    /// "1 item" / "N items", hidden when the cart is empty
    pub item_count: Option<String>,

    /// Current error message, if any
    pub error: Option<String>,

    /// Whether vendors are still loading
    pub loading: bool,

    /// Cart contents or the empty placeholder
    pub body: CartBody,

    /// Checkout modal, while open
    pub modal: Option<ModalView>,

    /// Whether checkout is done and the invoice can be downloaded
    pub invoice_ready: bool,
}

/// Main area of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartBody {
    /// Nothing in the cart.
    Empty(EmptyCartView),

    /// Cart lines and the order summary.
    Items {
        /// One entry per cart line
        lines: Vec<LineView>,

        /// Order summary panel
        summary: SummaryView,
    },
}

/// Empty cart placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyCartView {
    /// Heading
    pub title: &'static str,

    /// Hint below the heading
    pub hint: &'static str,

    /// Action label
    pub action: &'static str,
}

impl Default for EmptyCartView {
    fn default() -> Self {
        Self {
            title: EMPTY_TITLE,
            hint: EMPTY_HINT,
            action: CONTINUE_SHOPPING,
        }
    }
}

/// A cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineView {
    /// Cart line id
    pub id: CartItemId,

    /// Product name
    pub name: String,

    /// Product image URL
    pub image: Option<String>,

    /// Unit price, e.g. "₹100.00 each"
    pub unit_price: String,

    /// Edited quantity
    pub quantity: u32,

    /// Unit price times edited quantity
    pub line_total: String,

    /// Whether the decrement control is enabled
    pub can_decrement: bool,

    /// Whether a removal is in flight; all line controls are disabled while it is
    pub removing: bool,

    /// Payment method selector
    pub payment: PaymentSelectView,
}

/// Per-line payment method selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSelectView {
    /// Label shown when nothing is chosen
    pub placeholder: &'static str,

    /// Choices, in order
    pub options: [PaymentMethod; 3],

    /// Chosen method
    pub selected: Option<PaymentMethod>,

    /// Whether the selector can be changed
    pub enabled: bool,
}

/// An entry of the vendor selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorOption {
    /// Vendor id, `None` for the placeholder
    pub id: Option<VendorId>,

    /// Label shown
    pub label: String,

    /// Whether this entry is selected
    pub selected: bool,
}

/// A labelled amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountRow {
    /// Row label
    pub label: String,

    /// Formatted amount
    pub amount: String,
}

/// Subtotal, optional discount and total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalsView {
    /// Subtotal row
    pub subtotal: AmountRow,

    /// Discount row, only when a discount applies
    pub discount: Option<AmountRow>,

    /// Total row
    pub total: AmountRow,
}

impl TotalsView {
    fn new(totals: &Totals) -> Self {
        Self {
            subtotal: AmountRow {
                label: "Subtotal".to_string(),
                amount: format_rupees(&totals.subtotal),
            },
            discount: totals.has_discount().then(|| AmountRow {
                label: format!("Discount ({}%)", format_points(totals.discount_points)),
                amount: format!("-{}", format_rupees(&totals.discount)),
            }),
            total: AmountRow {
                label: "Total".to_string(),
                amount: format_rupees(&totals.total),
            },
        }
    }
}

/// The action at the bottom of the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryAction {
    /// Open the checkout modal.
    ProceedToCheckout {
        /// Disabled until a vendor is selected
        enabled: bool,
    },

    /// Checkout is done; download the invoice.
    DownloadInvoice,
}

impl PrimaryAction {
    /// Button label.
    pub fn label(self) -> &'static str {
        match self {
            Self::ProceedToCheckout { .. } => "Proceed to Checkout",
            Self::DownloadInvoice => "Download Invoice",
        }
    }
}

/// Order summary panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryView {
    /// Vendor selector entries, placeholder first
    pub vendors: Vec<VendorOption>,

    /// "{pct}% OFF" when the selected vendor gives a discount
    pub discount_badge: Option<String>,

    /// Totals
    pub totals: TotalsView,

    /// Checkout or invoice action
    pub action: PrimaryAction,
}

/// A button's label and state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonView {
    /// Label
    pub label: &'static str,

    /// Whether it can be pressed
    pub enabled: bool,
}

/// An itemised row in the checkout modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalRow {
    /// Product name
    pub name: String,

    /// "{qty} x {unit price}"
    pub detail: String,

    /// Line total
    pub amount: String,
}

/// Checkout modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalView {
    /// Itemised rows
    pub rows: Vec<ModalRow>,

    /// Totals
    pub totals: TotalsView,

    /// Confirm button
    pub confirm: ButtonView,

    /// Cancel button; hidden once the payment succeeded
    pub cancel: Option<ButtonView>,
}

impl ModalView {
    fn new(order: &Order, checkout: CheckoutState) -> Self {
        let rows = order
            .lines()
            .iter()
            .map(|line| ModalRow {
                name: line.name.clone(),
                detail: format!("{} x {}", line.quantity, format_rupees(&line.unit_price)),
                amount: format_rupees(&line.line_total),
            })
            .collect();

        let label = match checkout {
            CheckoutState::Processing => "Processing Payment...",
            CheckoutState::Succeeded => "Payment Successful",
            _ => "Confirm Payment",
        };

        Self {
            rows,
            totals: TotalsView::new(order.totals()),
            confirm: ButtonView {
                label,
                enabled: checkout == CheckoutState::Open,
            },
            cancel: (checkout != CheckoutState::Succeeded).then_some(ButtonView {
                label: "Cancel",
                enabled: checkout.can_cancel(),
            }),
        }
    }
}

/// Page state the view is built from.
#[derive(Debug)]
pub struct ViewContext<'a> {
    /// Cart lines from the store
    pub items: &'a [CartItem],

    /// The cart priced with edited quantities and the vendor discount
    pub order: &'a Order,

    /// Order frozen when the payment was confirmed; the modal keeps showing it while the cart
    /// is cleared
    pub confirmed_order: Option<&'a Order>,

    /// Loaded vendors
    pub vendors: &'a [Vendor],

    /// Selected vendor
    pub selected_vendor: Option<&'a VendorId>,

    /// Lines with a removal in flight
    pub removing: &'a FxHashSet<CartItemId>,

    /// Payment method each line is marked with
    pub payment_methods: &'a FxHashMap<CartItemId, PaymentMethod>,

    /// Checkout state
    pub checkout: CheckoutState,

    /// Error slot message
    pub error: Option<String>,

    /// Whether vendors are still loading
    pub loading: bool,
}

impl CartPageView {
    /// Build the view.
    pub fn build(context: &ViewContext<'_>) -> Self {
        let count = context.items.len();

        let item_count =
            (count > 0).then(|| format!("{count} {}", if count == 1 { "item" } else { "items" }));

        let body = if context.items.is_empty() {
            CartBody::Empty(EmptyCartView::default())
        } else {
            CartBody::Items {
                lines: line_views(context),
                summary: summary_view(context),
            }
        };

        let modal = context
            .checkout
            .is_modal_open()
            .then(|| {
                ModalView::new(
                    context.confirmed_order.unwrap_or(context.order),
                    context.checkout,
                )
            });

        Self {
            item_count,
            error: context.error.clone(),
            loading: context.loading,
            body,
            modal,
            invoice_ready: context.checkout.is_done(),
        }
    }

    /// Primary action of the page.
    ///
    /// Checkout empties the cart, so the invoice download stays available with the empty
    /// placeholder showing.
    pub fn primary_action(&self) -> Option<PrimaryAction> {
        match &self.body {
            CartBody::Items { summary, .. } => Some(summary.action),
            CartBody::Empty(_) => self.invoice_ready.then_some(PrimaryAction::DownloadInvoice),
        }
    }
}

fn line_views(context: &ViewContext<'_>) -> Vec<LineView> {
    context
        .items
        .iter()
        .zip(context.order.lines())
        .map(|(item, line)| LineView {
            id: item.id.clone(),
            name: line.name.clone(),
            image: item.product.image.clone(),
            unit_price: format!("{} each", format_rupees(&line.unit_price)),
            quantity: line.quantity.get(),
            line_total: format_rupees(&line.line_total),
            can_decrement: line.quantity.get() > 1,
            removing: context.removing.contains(&item.id),
            payment: PaymentSelectView {
                placeholder: PAYMENT_PLACEHOLDER,
                options: PaymentMethod::ALL,
                selected: context.payment_methods.get(&item.id).copied(),
                enabled: !context.removing.contains(&item.id),
            },
        })
        .collect()
}

fn summary_view(context: &ViewContext<'_>) -> SummaryView {
    let placeholder = VendorOption {
        id: None,
        label: VENDOR_PLACEHOLDER.to_string(),
        selected: context.selected_vendor.is_none(),
    };

    let vendors = std::iter::once(placeholder)
        .chain(context.vendors.iter().map(|vendor| VendorOption {
            id: Some(vendor.id.clone()),
            label: vendor.firm_name.clone(),
            selected: context.selected_vendor == Some(&vendor.id),
        }))
        .collect();

    let totals = context.order.totals();

    let discount_badge = (totals.discount_points > Decimal::ZERO)
        .then(|| format!("{}% OFF", format_points(totals.discount_points)));

    let action = if context.checkout.is_done() {
        PrimaryAction::DownloadInvoice
    } else {
        PrimaryAction::ProceedToCheckout {
            enabled: context
                .selected_vendor
                .is_some_and(|id| find_vendor(context.vendors, id).is_some()),
        }
    };

    SummaryView {
        vendors,
        discount_badge,
        totals: TotalsView::new(totals),
        action,
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use rusty_money::Money;
    use testresult::TestResult;

    use crate::{money::currency, products::Product, quantities::EditedQuantities};

    use super::*;

    fn items() -> Vec<CartItem> {
        vec![CartItem::new(
            "c-1",
            Product::new("p-1", "Abaya", Money::from_minor(10_000, currency()))
                .with_image("https://img.example/abaya.png"),
            NonZeroU32::MIN.saturating_add(1),
        )]
    }

    fn vendors() -> Vec<Vendor> {
        vec![
            Vendor::new("v-1", "Noor Textiles", Some(Decimal::from(10))),
            Vendor::new("v-2", "Plain Co", None),
        ]
    }

    fn build(
        items: &[CartItem],
        selected: Option<&VendorId>,
        checkout: CheckoutState,
    ) -> Result<CartPageView, crate::pricing::PricingError> {
        let vendors = vendors();
        let points = crate::vendors::discount_points_for(&vendors, selected);
        let order = Order::price(
            items,
            &EditedQuantities::from_items(items),
            selected.cloned(),
            points,
        )?;
        let removing = FxHashSet::default();
        let payment_methods = FxHashMap::default();

        Ok(CartPageView::build(&ViewContext {
            items,
            order: &order,
            confirmed_order: None,
            vendors: &vendors,
            selected_vendor: selected,
            removing: &removing,
            payment_methods: &payment_methods,
            checkout,
            error: None,
            loading: false,
        }))
    }

    #[test]
    fn empty_cart_shows_placeholder() -> TestResult {
        let view = build(&[], None, CheckoutState::Closed)?;

        assert_eq!(view.body, CartBody::Empty(EmptyCartView::default()));
        assert_eq!(view.item_count, None);
        assert_eq!(view.primary_action(), None);

        Ok(())
    }

    #[test]
    fn checkout_disabled_without_vendor() -> TestResult {
        let view = build(&items(), None, CheckoutState::Closed)?;

        assert_eq!(view.item_count.as_deref(), Some("1 item"));
        assert_eq!(
            view.primary_action(),
            Some(PrimaryAction::ProceedToCheckout { enabled: false })
        );

        Ok(())
    }

    #[test]
    fn discount_badge_and_row_with_discounted_vendor() -> TestResult {
        let vendor = VendorId::new("v-1");
        let view = build(&items(), Some(&vendor), CheckoutState::Closed)?;

        let CartBody::Items { lines, summary } = view.body else {
            return Err("expected cart lines".into());
        };

        let line = lines.first().ok_or("missing line")?;

        assert_eq!(line.unit_price, "₹100.00 each");
        assert_eq!(line.line_total, "₹200.00");
        assert!(line.can_decrement);
        assert_eq!(line.image.as_deref(), Some("https://img.example/abaya.png"));

        assert_eq!(summary.discount_badge.as_deref(), Some("10% OFF"));
        assert_eq!(
            summary.totals.discount,
            Some(AmountRow {
                label: "Discount (10%)".to_string(),
                amount: "-₹20.00".to_string(),
            })
        );
        assert_eq!(summary.totals.total.amount, "₹180.00");
        assert_eq!(
            summary.action,
            PrimaryAction::ProceedToCheckout { enabled: true }
        );

        let selected: Vec<_> = summary
            .vendors
            .iter()
            .filter(|option| option.selected)
            .map(|option| option.label.as_str())
            .collect();

        assert_eq!(selected, ["Noor Textiles"]);
        assert_eq!(
            summary.vendors.first().map(|option| option.label.as_str()),
            Some(VENDOR_PLACEHOLDER)
        );

        Ok(())
    }

    #[test]
    fn unknown_vendor_keeps_checkout_disabled() -> TestResult {
        let vendor = VendorId::new("typo");
        let view = build(&items(), Some(&vendor), CheckoutState::Closed)?;

        assert_eq!(
            view.primary_action(),
            Some(PrimaryAction::ProceedToCheckout { enabled: false })
        );

        Ok(())
    }

    #[test]
    fn vendor_without_discount_hides_badge() -> TestResult {
        let vendor = VendorId::new("v-2");
        let view = build(&items(), Some(&vendor), CheckoutState::Closed)?;

        let CartBody::Items { summary, .. } = view.body else {
            return Err("expected cart lines".into());
        };

        assert_eq!(summary.discount_badge, None);
        assert_eq!(summary.totals.discount, None);

        Ok(())
    }

    #[test]
    fn modal_labels_follow_checkout_state() -> TestResult {
        let vendor = VendorId::new("v-1");

        let open = build(&items(), Some(&vendor), CheckoutState::Open)?
            .modal
            .ok_or("modal should be open")?;

        assert_eq!(
            open.confirm,
            ButtonView {
                label: "Confirm Payment",
                enabled: true
            }
        );
        assert_eq!(open.cancel.map(|cancel| cancel.enabled), Some(true));
        assert_eq!(
            open.rows.first().map(|row| row.detail.as_str()),
            Some("2 x ₹100.00")
        );

        let processing = build(&items(), Some(&vendor), CheckoutState::Processing)?
            .modal
            .ok_or("modal should be open")?;

        assert_eq!(processing.confirm.label, "Processing Payment...");
        assert!(!processing.confirm.enabled);
        assert_eq!(processing.cancel.map(|cancel| cancel.enabled), Some(false));

        let succeeded = build(&items(), Some(&vendor), CheckoutState::Succeeded)?
            .modal
            .ok_or("modal should be open")?;

        assert_eq!(succeeded.confirm.label, "Payment Successful");
        assert_eq!(succeeded.cancel, None);

        Ok(())
    }

    #[test]
    fn done_swaps_in_download_invoice() -> TestResult {
        let vendor = VendorId::new("v-1");
        let view = build(&items(), Some(&vendor), CheckoutState::Done)?;

        assert_eq!(view.modal, None);
        assert_eq!(view.primary_action(), Some(PrimaryAction::DownloadInvoice));
        assert_eq!(PrimaryAction::DownloadInvoice.label(), "Download Invoice");

        Ok(())
    }

    #[test]
    fn invoice_stays_available_once_cart_is_cleared() -> TestResult {
        let vendor = VendorId::new("v-1");
        let view = build(&[], Some(&vendor), CheckoutState::Done)?;

        assert!(matches!(view.body, CartBody::Empty(_)));
        assert_eq!(view.primary_action(), Some(PrimaryAction::DownloadInvoice));

        Ok(())
    }
}
