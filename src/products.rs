//! Products

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    ids::TypedId,
    money::{AmountError, Rupees, rupees_from_decimal},
};

/// Product identifier, as used by `DELETE /cart/remove/{productId}`.
pub type ProductId = TypedId<Product>;

/// Product referenced by a cart line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "ProductRecord")]
pub struct Product {
    /// Product id
    pub id: ProductId,

    /// Product name
    pub name: String,

    /// Unit price
    pub price: Rupees,

    /// Image URL, if the product has one
    pub image: Option<String>,
}

impl Product {
    /// Create a product without an image.
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Rupees) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            image: None,
        }
    }

    /// Attach an image URL.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// Product as it arrives from the backend, with the price in major units.
#[derive(Debug, Deserialize)]
struct ProductRecord {
    #[serde(rename = "_id")]
    id: ProductId,
    name: String,
    price: Decimal,
    #[serde(default)]
    image: Option<String>,
}

impl TryFrom<ProductRecord> for Product {
    type Error = AmountError;

    fn try_from(record: ProductRecord) -> Result<Self, Self::Error> {
        Ok(Product {
            id: record.id,
            name: record.name,
            price: rupees_from_decimal(record.price)?,
            image: record.image.filter(|image| !image.is_empty()),
        })
    }
}
