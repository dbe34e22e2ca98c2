//! Money
//!
//! Every amount on the cart page is in Indian rupees. Amounts are carried as [`Money`] and all
//! arithmetic happens in minor units (paise).

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use thiserror::Error;

/// Currency used by the storefront.
pub fn currency() -> &'static Currency {
    iso::INR
}

/// Symbol printed in front of every formatted amount.
pub const RUPEE_SYMBOL: &str = "₹";

/// Rupee amount.
pub type Rupees = Money<'static, Currency>;

/// Errors converting backend amounts into money.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    /// The amount is negative.
    #[error("amount {0} is negative")]
    Negative(Decimal),

    /// The amount does not fit in minor units.
    #[error("amount {0} is out of range")]
    OutOfRange(Decimal),
}

/// Zero rupees.
pub fn zero() -> Rupees {
    Money::from_minor(0, currency())
}

/// Convert a major-unit decimal (e.g. `99.5`) into rupees, rounding half away from zero to the
/// nearest paisa.
///
/// # Errors
///
/// - [`AmountError::Negative`]: prices can't be negative.
/// - [`AmountError::OutOfRange`]: the amount can't be represented in minor units.
pub fn rupees_from_decimal(amount: Decimal) -> Result<Rupees, AmountError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AmountError::Negative(amount));
    }

    let minor = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|value| value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|value| value.to_i64())
        .ok_or(AmountError::OutOfRange(amount))?;

    Ok(Money::from_minor(minor, currency()))
}

/// Format an amount with the rupee symbol, Indian digit grouping and two decimals,
/// e.g. `₹1,234.50` or `₹12,34,567.89`.
pub fn format_rupees(amount: &Rupees) -> String {
    format!("{amount}")
}

/// Format a minor-unit amount the same way as [`format_rupees`].
pub fn format_minor(minor_units: i64) -> String {
    format_rupees(&Money::from_minor(minor_units, currency()))
}
