//! Orders
//!
//! An [`Order`] freezes the cart as the user sees it: the edited quantities, the selected vendor
//! and the resulting totals. The checkout modal, the payment gateway and the invoice all read
//! from it.

use std::num::NonZeroU32;

use rust_decimal::Decimal;
use smallvec::SmallVec;

use crate::{
    items::{CartItem, CartItemId},
    money::Rupees,
    pricing::{PricingError, Totals, calculate_totals, line_total},
    products::ProductId,
    quantities::EditedQuantities,
    vendors::VendorId,
};

/// A priced order line.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    /// Cart line this came from
    pub item: CartItemId,

    /// Product on the line
    pub product: ProductId,

    /// Product name at the time the order was taken
    pub name: String,

    /// Unit price
    pub unit_price: Rupees,

    /// Edited quantity
    pub quantity: NonZeroU32,

    /// Unit price times quantity
    pub line_total: Rupees,
}

/// Priced snapshot of the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    lines: SmallVec<[OrderLine; 8]>,
    vendor: Option<VendorId>,
    totals: Totals,
}

impl Order {
    /// Price `items` using the page's edited quantities and the vendor discount (percent points).
    ///
    /// Lines missing from `quantities` use the store's quantity.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if a line or the totals can't be represented.
    pub fn price(
        items: &[CartItem],
        quantities: &EditedQuantities,
        vendor: Option<VendorId>,
        discount_points: Decimal,
    ) -> Result<Self, PricingError> {
        let lines = items
            .iter()
            .map(|item| {
                let quantity = quantities.quantity_or(&item.id, item.quantity);

                Ok(OrderLine {
                    item: item.id.clone(),
                    product: item.product.id.clone(),
                    name: item.product.name.clone(),
                    unit_price: item.product.price,
                    quantity,
                    line_total: line_total(&item.product.price, quantity)?,
                })
            })
            .collect::<Result<SmallVec<[OrderLine; 8]>, PricingError>>()?;

        let totals = calculate_totals(
            lines.iter().map(|line| (line.unit_price, line.quantity)),
            discount_points,
        )?;

        Ok(Self {
            lines,
            vendor,
            totals,
        })
    }

    /// Priced lines, in cart order.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Vendor the order is placed through.
    pub fn vendor(&self) -> Option<&VendorId> {
        self.vendor.as_ref()
    }

    /// Subtotal, discount and total.
    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    /// Whether the order has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
