//! Pricing
//!
//! Subtotal, vendor discount and total for the cart. Everything is computed from scratch on every
//! call; nothing is cached.

use std::num::NonZeroU32;

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, MoneyError};
use thiserror::Error;

use crate::{
    money::{Rupees, currency},
    vendors::points_to_percentage,
};

/// Errors that can occur while pricing the cart.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// A line or the subtotal overflowed minor units.
    #[error("price overflowed while calculating totals")]
    Overflow,

    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Totals shown in the order summary, the checkout modal and the invoice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    /// Sum of unit price times quantity over all lines
    pub subtotal: Rupees,

    /// Discount in percent points
    pub discount_points: Decimal,

    /// Discount amount taken off the subtotal
    pub discount: Rupees,

    /// Subtotal minus discount
    pub total: Rupees,
}

impl Totals {
    /// Totals for an empty cart.
    pub fn zero() -> Self {
        let zero = Money::from_minor(0, currency());

        Self {
            subtotal: zero,
            discount_points: Decimal::ZERO,
            discount: zero,
            total: zero,
        }
    }

    /// Whether a discount is being applied.
    pub fn has_discount(&self) -> bool {
        self.discount_points > Decimal::ZERO
    }
}

/// Unit price times quantity.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the result doesn't fit in minor units.
pub fn line_total(price: &Rupees, quantity: NonZeroU32) -> Result<Rupees, PricingError> {
    let minor = price
        .to_minor_units()
        .checked_mul(i64::from(quantity.get()))
        .ok_or(PricingError::Overflow)?;

    Ok(Money::from_minor(minor, price.currency()))
}

/// Calculate subtotal, discount and total for a set of `(unit price, quantity)` lines.
///
/// `discount_points` is the vendor discount in percent points (`10` for 10% off). The discount
/// amount is rounded half away from zero to the nearest paisa.
///
/// # Errors
///
/// - [`PricingError::Overflow`]: a line or the subtotal doesn't fit in minor units.
/// - [`PricingError::PercentConversion`]: the discount can't be represented in minor units.
/// - [`PricingError::Money`]: wrapped money arithmetic or currency mismatch error.
pub fn calculate_totals(
    lines: impl IntoIterator<Item = (Rupees, NonZeroU32)>,
    discount_points: Decimal,
) -> Result<Totals, PricingError> {
    let subtotal = lines.into_iter().try_fold(
        Money::from_minor(0, currency()),
        |acc, (price, quantity)| -> Result<Rupees, PricingError> {
            let line = line_total(&price, quantity)?;

            if line.currency() != acc.currency() {
                return Err(MoneyError::CurrencyMismatch {
                    expected: acc.currency().iso_alpha_code,
                    actual: line.currency().iso_alpha_code,
                }
                .into());
            }

            let sum = acc
                .to_minor_units()
                .checked_add(line.to_minor_units())
                .ok_or(PricingError::Overflow)?;

            Ok(Money::from_minor(sum, currency()))
        },
    )?;

    let percent = points_to_percentage(discount_points);
    let discount_minor = percent_of_minor(&percent, subtotal.to_minor_units())?;
    let discount = Money::from_minor(discount_minor, currency());
    let total = subtotal.sub(discount)?;

    Ok(Totals {
        subtotal,
        discount_points,
        discount,
        total,
    })
}

/// Calculate `percent` of a minor-unit amount, rounded half away from zero.
///
/// # Errors
///
/// Returns [`PricingError::PercentConversion`] if the result overflows or cannot be represented.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, PricingError> {
    let minor = Decimal::from_i64(minor).ok_or(PricingError::PercentConversion)?;

    ((*percent) * Decimal::ONE)
        .checked_mul(minor)
        .ok_or(PricingError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PricingError::PercentConversion)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rusty_money::iso;
    use testresult::TestResult;

    use super::*;

    fn rupees(minor: i64) -> Rupees {
        Money::from_minor(minor, currency())
    }

    fn qty(value: u32) -> NonZeroU32 {
        NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
    }

    #[test]
    fn single_line_with_ten_percent_discount() -> TestResult {
        let totals = calculate_totals([(rupees(10_000), qty(2))], Decimal::from(10))?;

        assert_eq!(totals.subtotal, rupees(20_000));
        assert_eq!(totals.discount, rupees(2_000));
        assert_eq!(totals.total, rupees(18_000));
        assert!(totals.has_discount());

        Ok(())
    }

    #[test]
    fn subtotal_sums_every_line() -> TestResult {
        let totals = calculate_totals(
            [
                (rupees(14_950), qty(1)),
                (rupees(30_000), qty(3)),
                (rupees(99), qty(7)),
            ],
            Decimal::ZERO,
        )?;

        assert_eq!(totals.subtotal, rupees(14_950 + 90_000 + 693));
        assert_eq!(totals.discount, rupees(0));
        assert_eq!(totals.total, totals.subtotal);
        assert!(!totals.has_discount());

        Ok(())
    }

    #[test]
    fn empty_cart_is_zero() -> TestResult {
        let totals = calculate_totals([], Decimal::from(25))?;

        assert_eq!(totals.subtotal, rupees(0));
        assert_eq!(totals.discount, rupees(0));
        assert_eq!(totals.total, rupees(0));

        Ok(())
    }

    #[test]
    fn fractional_discount_rounds_to_nearest_paisa() -> TestResult {
        // 12.5% of 333 paise is 41.625 paise.
        let totals = calculate_totals([(rupees(333), qty(1))], Decimal::from_str("12.5")?)?;

        assert_eq!(totals.discount, rupees(42));
        assert_eq!(totals.total, rupees(291));

        Ok(())
    }

    #[test]
    fn total_never_negative_within_discount_range() -> TestResult {
        let prices = [0, 1, 99, 100, 12_345, 999_999];
        let quantities = [1, 2, 7, 100];
        let points = ["0", "0.5", "10", "33.33", "99.99", "100"];

        for price in prices {
            for quantity in quantities {
                for point in points {
                    let discount_points = Decimal::from_str(point)?;
                    let totals =
                        calculate_totals([(rupees(price), qty(quantity))], discount_points)?;

                    let expected_subtotal = price * i64::from(quantity);

                    assert_eq!(totals.subtotal.to_minor_units(), expected_subtotal);
                    assert_eq!(
                        totals.total.to_minor_units(),
                        expected_subtotal - totals.discount.to_minor_units(),
                        "total must be subtotal minus discount"
                    );
                    assert!(
                        totals.total.to_minor_units() >= 0,
                        "total went negative for price={price} qty={quantity} pct={point}"
                    );
                }
            }
        }

        Ok(())
    }

    #[test]
    fn line_total_overflow_is_reported() {
        let result = line_total(&rupees(i64::MAX), qty(2));

        assert_eq!(result, Err(PricingError::Overflow));
    }

    #[test]
    fn mismatched_currency_is_rejected() {
        let result = calculate_totals(
            [
                (rupees(100), qty(1)),
                (Money::from_minor(100, iso::USD), qty(1)),
            ],
            Decimal::ZERO,
        );

        assert!(matches!(result, Err(PricingError::Money(_))));
    }

    #[test]
    fn percent_of_minor_overflow_returns_error() {
        let percent = Percentage::from(2.0);
        let result = percent_of_minor(&percent, i64::MAX);

        assert_eq!(result, Err(PricingError::PercentConversion));
    }
}
