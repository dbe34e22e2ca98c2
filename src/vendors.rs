//! Vendors
//!
//! Vendors come from `GET /user`. Each may carry a discount in percent points which the cart page
//! applies to the whole subtotal once the vendor is selected.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::ids::TypedId;

/// Vendor identifier.
pub type VendorId = TypedId<Vendor>;

/// A vendor the order can be placed through.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Vendor {
    /// Vendor id
    #[serde(rename = "_id")]
    pub id: VendorId,

    /// Display name
    #[serde(rename = "firmName", default)]
    pub firm_name: String,

    /// Discount in percent points (`10` means 10% off), if any
    #[serde(default)]
    pub discount: Option<Decimal>,
}

impl Vendor {
    /// Create a vendor with an optional discount in percent points.
    pub fn new(
        id: impl Into<VendorId>,
        firm_name: impl Into<String>,
        discount: Option<Decimal>,
    ) -> Self {
        Self {
            id: id.into(),
            firm_name: firm_name.into(),
            discount,
        }
    }

    /// Discount in percent points, clamped to `0..=100`. Vendors without a discount give `0`.
    pub fn discount_points(&self) -> Decimal {
        self.discount
            .unwrap_or(Decimal::ZERO)
            .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
    }
}

/// Look up a loaded vendor by id.
pub fn find_vendor<'a>(vendors: &'a [Vendor], id: &VendorId) -> Option<&'a Vendor> {
    vendors.iter().find(|vendor| &vendor.id == id)
}

/// Discount for the selected vendor in percent points.
///
/// Returns `0` when nothing is selected or the id isn't in `vendors`.
pub fn discount_points_for(vendors: &[Vendor], selected: Option<&VendorId>) -> Decimal {
    selected
        .and_then(|id| find_vendor(vendors, id))
        .map_or(Decimal::ZERO, Vendor::discount_points)
}

/// Convert percent points (`10`) into a fractional [`Percentage`] (`0.10`).
pub fn points_to_percentage(points: Decimal) -> Percentage {
    Percentage::from(points / Decimal::ONE_HUNDRED)
}

/// Render percent points without trailing zeros, e.g. `10` or `12.5`.
pub fn format_points(points: Decimal) -> String {
    points.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use testresult::TestResult;

    use super::*;

    fn vendors() -> Vec<Vendor> {
        vec![
            Vendor::new("v-1", "Noor Traders", Some(Decimal::from(10))),
            Vendor::new("v-2", "Zam Zam Textiles", None),
        ]
    }

    #[test]
    fn deserializes_vendor_with_discount() -> TestResult {
        let vendor: Vendor = serde_json::from_value(serde_json::json!({
            "_id": "v-1",
            "firmName": "Noor Traders",
            "discount": 12.5,
            "email": "noor@example.com"
        }))?;

        assert_eq!(vendor.firm_name, "Noor Traders");
        assert_eq!(vendor.discount, Some(Decimal::from_str("12.5")?));

        Ok(())
    }

    #[test]
    fn missing_or_null_discount_is_zero() -> TestResult {
        let missing: Vendor = serde_json::from_value(serde_json::json!({
            "_id": "v-2",
            "firmName": "Zam Zam Textiles"
        }))?;

        let null: Vendor = serde_json::from_value(serde_json::json!({
            "_id": "v-3",
            "firmName": "Al Huda",
            "discount": null
        }))?;

        assert_eq!(missing.discount_points(), Decimal::ZERO);
        assert_eq!(null.discount_points(), Decimal::ZERO);

        Ok(())
    }

    #[test]
    fn out_of_range_discounts_are_clamped() {
        let negative = Vendor::new("v-4", "Odd", Some(Decimal::from(-5)));
        let huge = Vendor::new("v-5", "Generous", Some(Decimal::from(150)));

        assert_eq!(negative.discount_points(), Decimal::ZERO);
        assert_eq!(huge.discount_points(), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn discount_lookup_defaults_to_zero() {
        let vendors = vendors();

        assert_eq!(
            discount_points_for(&vendors, Some(&VendorId::new("v-1"))),
            Decimal::from(10)
        );
        assert_eq!(
            discount_points_for(&vendors, Some(&VendorId::new("v-2"))),
            Decimal::ZERO
        );
        assert_eq!(
            discount_points_for(&vendors, Some(&VendorId::new("unknown"))),
            Decimal::ZERO
        );
        assert_eq!(discount_points_for(&vendors, None), Decimal::ZERO);
    }

    #[test]
    fn find_vendor_only_matches_loaded_ids() {
        let vendors = vendors();

        assert_eq!(
            find_vendor(&vendors, &VendorId::new("v-2")).map(|vendor| vendor.firm_name.as_str()),
            Some("Zam Zam Textiles")
        );
        assert_eq!(find_vendor(&vendors, &VendorId::new("typo")), None);
        assert_eq!(find_vendor(&[], &VendorId::new("v-1")), None);
    }

    #[test]
    fn points_format_without_trailing_zeros() -> TestResult {
        assert_eq!(format_points(Decimal::from(10)), "10");
        assert_eq!(format_points(Decimal::from_str("12.50")?), "12.5");

        Ok(())
    }
}
