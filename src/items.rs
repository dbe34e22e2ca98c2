//! Cart Items

use std::num::NonZeroU32;

use serde::Deserialize;

use crate::{ids::TypedId, products::Product};

/// Cart line identifier.
pub type CartItemId = TypedId<CartItem>;

/// A line in the shopping cart.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CartItem {
    /// Cart line id
    #[serde(rename = "_id")]
    pub id: CartItemId,

    /// Product on this line
    pub product: Product,

    /// Quantity stored server-side
    #[serde(deserialize_with = "deserialize_quantity")]
    pub quantity: NonZeroU32,
}

impl CartItem {
    /// Create a new cart line.
    pub fn new(id: impl Into<CartItemId>, product: Product, quantity: NonZeroU32) -> Self {
        Self {
            id: id.into(),
            product,
            quantity,
        }
    }
}

/// Zero or null server quantities are shown as a single unit.
fn deserialize_quantity<'de, D>(deserializer: D) -> Result<NonZeroU32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let quantity = Option::<u32>::deserialize(deserializer)?;

    Ok(quantity.and_then(NonZeroU32::new).unwrap_or(NonZeroU32::MIN))
}
