//! Edited Quantities
//!
//! The cart page keeps its own copy of each line's quantity. Edits stay local until checkout reads
//! them; nothing is written back to the cart store.
//!
//! Reconciliation: whenever the set of cart line ids seen in the store differs from the ids held
//! here, the whole map is re-derived from the store's quantities and any earlier edits are treated
//! as stale. While the id set is unchanged, edits survive store refreshes.

use std::num::NonZeroU32;

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::items::{CartItem, CartItemId};

/// Errors from quantity edits.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuantityError {
    /// The cart line isn't in the cart.
    #[error("cart item {0} is not in the cart")]
    UnknownItem(CartItemId),
}

/// Page-local quantities keyed by cart line id.
#[derive(Debug, Clone, Default)]
pub struct EditedQuantities {
    quantities: FxHashMap<CartItemId, NonZeroU32>,
}

impl EditedQuantities {
    /// Seed quantities from the store's cart lines.
    pub fn from_items(items: &[CartItem]) -> Self {
        Self {
            quantities: items
                .iter()
                .map(|item| (item.id.clone(), item.quantity))
                .collect(),
        }
    }

    /// Bring the map in line with `items`.
    ///
    /// Returns `true` if the id set changed and the map was re-derived.
    pub fn reconcile(&mut self, items: &[CartItem]) -> bool {
        let incoming: FxHashSet<&CartItemId> = items.iter().map(|item| &item.id).collect();

        let unchanged = incoming.len() == self.quantities.len()
            && incoming.iter().all(|id| self.quantities.contains_key(*id));

        if unchanged {
            return false;
        }

        *self = Self::from_items(items);

        true
    }

    /// Quantity for a line, falling back to `fallback` if the line isn't tracked.
    pub fn quantity_or(&self, id: &CartItemId, fallback: NonZeroU32) -> NonZeroU32 {
        self.quantities.get(id).copied().unwrap_or(fallback)
    }

    /// Quantity for a line.
    pub fn get(&self, id: &CartItemId) -> Option<NonZeroU32> {
        self.quantities.get(id).copied()
    }

    /// Set a line's quantity. Values below 1 are ignored.
    ///
    /// Returns the quantity now held for the line.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::UnknownItem`] if the line isn't tracked.
    pub fn set(&mut self, id: &CartItemId, quantity: u32) -> Result<NonZeroU32, QuantityError> {
        let current = self
            .quantities
            .get_mut(id)
            .ok_or_else(|| QuantityError::UnknownItem(id.clone()))?;

        if let Some(quantity) = NonZeroU32::new(quantity) {
            *current = quantity;
        }

        Ok(*current)
    }

    /// Add one to a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::UnknownItem`] if the line isn't tracked.
    pub fn increment(&mut self, id: &CartItemId) -> Result<NonZeroU32, QuantityError> {
        let current = self.current(id)?;

        self.set(id, current.get().saturating_add(1))
    }

    /// Take one off a line's quantity. At 1 this is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::UnknownItem`] if the line isn't tracked.
    pub fn decrement(&mut self, id: &CartItemId) -> Result<NonZeroU32, QuantityError> {
        let current = self.current(id)?;

        self.set(id, current.get() - 1)
    }

    /// Apply typed input from the quantity field.
    ///
    /// The leading whole number is used and trailing text is ignored, so `"7abc"` is 7. Input
    /// without a number, or zero, counts as 1. A negative number leaves the quantity unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::UnknownItem`] if the line isn't tracked.
    pub fn enter(&mut self, id: &CartItemId, input: &str) -> Result<NonZeroU32, QuantityError> {
        match leading_integer(input) {
            None | Some(0) => self.set(id, 1),
            Some(value) if value < 0 => self.current(id),
            Some(value) => self.set(id, u32::try_from(value).unwrap_or(u32::MAX)),
        }
    }

    /// Number of tracked lines.
    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    /// Whether no lines are tracked.
    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    fn current(&self, id: &CartItemId) -> Result<NonZeroU32, QuantityError> {
        self.get(id)
            .ok_or_else(|| QuantityError::UnknownItem(id.clone()))
    }
}

/// Leading signed integer of `input`, skipping leading whitespace. Saturates on overflow.
fn leading_integer(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = rest.get(..end).filter(|digits| !digits.is_empty())?;
    let magnitude = i64::from(digits.parse::<u32>().unwrap_or(u32::MAX));

    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use rusty_money::Money;
    use testresult::TestResult;

    use crate::{money::currency, products::Product};

    use super::*;

    fn item(id: &str, quantity: u32) -> CartItem {
        CartItem::new(
            id,
            Product::new(format!("p-{id}"), "Abaya", Money::from_minor(10_000, currency())),
            NonZeroU32::new(quantity).unwrap_or(NonZeroU32::MIN),
        )
    }

    fn id(raw: &str) -> CartItemId {
        CartItemId::new(raw)
    }

    #[test]
    fn seeds_from_store_quantities() {
        let quantities = EditedQuantities::from_items(&[item("a", 2), item("b", 5)]);

        assert_eq!(quantities.len(), 2);
        assert_eq!(quantities.get(&id("a")).map(NonZeroU32::get), Some(2));
        assert_eq!(quantities.get(&id("b")).map(NonZeroU32::get), Some(5));
    }

    #[test]
    fn decrement_stops_at_one() -> TestResult {
        let mut quantities = EditedQuantities::from_items(&[item("a", 2)]);

        assert_eq!(quantities.decrement(&id("a"))?.get(), 1);
        assert_eq!(quantities.decrement(&id("a"))?.get(), 1);
        assert_eq!(quantities.get(&id("a")).map(NonZeroU32::get), Some(1));

        Ok(())
    }

    #[test]
    fn increment_adds_one() -> TestResult {
        let mut quantities = EditedQuantities::from_items(&[item("a", 1)]);

        quantities.increment(&id("a"))?;

        assert_eq!(quantities.increment(&id("a"))?.get(), 3);

        Ok(())
    }

    #[test]
    fn setting_zero_is_ignored() -> TestResult {
        let mut quantities = EditedQuantities::from_items(&[item("a", 4)]);

        assert_eq!(quantities.set(&id("a"), 0)?.get(), 4);

        Ok(())
    }

    #[test]
    fn typed_input_falls_back_to_one() -> TestResult {
        let mut quantities = EditedQuantities::from_items(&[item("a", 4)]);

        assert_eq!(quantities.enter(&id("a"), " 7 ")?.get(), 7);
        assert_eq!(quantities.enter(&id("a"), "abc")?.get(), 1);

        quantities.set(&id("a"), 3)?;

        assert_eq!(quantities.enter(&id("a"), "0")?.get(), 1);
        assert_eq!(quantities.enter(&id("a"), "")?.get(), 1);

        Ok(())
    }

    #[test]
    fn typed_input_uses_leading_number() -> TestResult {
        let mut quantities = EditedQuantities::from_items(&[item("a", 4)]);

        assert_eq!(quantities.enter(&id("a"), "7abc")?.get(), 7);
        assert_eq!(quantities.enter(&id("a"), "+3")?.get(), 3);
        assert_eq!(quantities.enter(&id("a"), "99999999999")?.get(), u32::MAX);

        Ok(())
    }

    #[test]
    fn negative_input_is_ignored() -> TestResult {
        let mut quantities = EditedQuantities::from_items(&[item("a", 4)]);

        assert_eq!(quantities.enter(&id("a"), "-2")?.get(), 4);
        assert_eq!(quantities.enter(&id("a"), "-0")?.get(), 1);
        assert_eq!(quantities.get(&id("a")).map(NonZeroU32::get), Some(1));

        Ok(())
    }

    #[test]
    fn unknown_item_is_an_error() {
        let mut quantities = EditedQuantities::from_items(&[item("a", 1)]);

        assert_eq!(
            quantities.increment(&id("zzz")),
            Err(QuantityError::UnknownItem(id("zzz")))
        );
    }

    #[test]
    fn reconcile_keeps_edits_when_ids_unchanged() -> TestResult {
        let items = [item("a", 1), item("b", 1)];
        let mut quantities = EditedQuantities::from_items(&items);

        quantities.set(&id("a"), 9)?;

        assert!(!quantities.reconcile(&items));
        assert_eq!(quantities.get(&id("a")).map(NonZeroU32::get), Some(9));

        Ok(())
    }

    #[test]
    fn reconcile_rederives_when_ids_change() -> TestResult {
        let mut quantities = EditedQuantities::from_items(&[item("a", 1), item("b", 2)]);

        quantities.set(&id("b"), 9)?;

        assert!(quantities.reconcile(&[item("b", 2), item("c", 3)]));
        assert_eq!(quantities.get(&id("a")), None);
        assert_eq!(quantities.get(&id("b")).map(NonZeroU32::get), Some(2));
        assert_eq!(quantities.get(&id("c")).map(NonZeroU32::get), Some(3));

        Ok(())
    }

    #[test]
    fn reconcile_to_empty_clears_everything() {
        let mut quantities = EditedQuantities::from_items(&[item("a", 1)]);

        assert!(quantities.reconcile(&[]));
        assert!(quantities.is_empty());
    }
}
