//! Payment
//!
//! Checkout charges the order through a [`PaymentGateway`]. The only gateway shipped here is
//! [`SimulatedGateway`], which waits a fixed delay and always succeeds. There is no real payment
//! provider behind it.

use std::{fmt, str::FromStr, time::Duration};

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::{money::Rupees, order::Order};

/// How long the simulated gateway takes to "process" a payment.
pub const DEFAULT_PAYMENT_DELAY: Duration = Duration::from_secs(2);

/// Errors a payment gateway can report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaymentError {
    /// There was nothing to charge.
    #[error("order has no lines")]
    EmptyOrder,

    /// The gateway refused the payment.
    #[error("payment declined: {0}")]
    Declined(String),

    /// The payment method name isn't one of [`PaymentMethod::ALL`].
    #[error("unknown payment method {0:?}")]
    UnknownMethod(String),
}

/// Proof that an order was paid.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReceipt {
    /// Gateway reference for the charge
    pub reference: Uuid,

    /// Amount charged
    pub amount: Rupees,
}

/// Payment method a cart line can be marked with.
///
/// The choice is recorded per line and shown back, but it doesn't change how the order is charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentMethod {
    /// Google Pay
    GPay,

    /// PhonePe
    PhonePay,

    /// Debit or credit card
    Card,
}

impl PaymentMethod {
    /// Every method, in selector order.
    pub const ALL: [Self; 3] = [Self::GPay, Self::PhonePay, Self::Card];

    /// Label shown in the selector.
    pub fn label(self) -> &'static str {
        match self {
            Self::GPay => "G-Pay",
            Self::PhonePay => "Phone-Pay",
            Self::Card => "Card",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentMethod {
    type Err = PaymentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gpay" | "g-pay" => Ok(Self::GPay),
            "phonepay" | "phone-pay" => Ok(Self::PhonePay),
            "card" => Ok(Self::Card),
            _ => Err(PaymentError::UnknownMethod(value.to_string())),
        }
    }
}

/// Something that can take payment for an order.
#[automock]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charge the order total.
    async fn charge(&self, order: &Order) -> Result<PaymentReceipt, PaymentError>;
}

/// Gateway that sleeps for a fixed delay and then approves the charge.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedGateway {
    delay: Duration,
}

impl SimulatedGateway {
    /// Create a gateway that takes `delay` to approve each charge.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Configured processing delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new(DEFAULT_PAYMENT_DELAY)
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    #[tracing::instrument(skip_all, fields(total = %order.totals().total))]
    async fn charge(&self, order: &Order) -> Result<PaymentReceipt, PaymentError> {
        if order.is_empty() {
            return Err(PaymentError::EmptyOrder);
        }

        tokio::time::sleep(self.delay).await;

        let receipt = PaymentReceipt {
            reference: Uuid::new_v4(),
            amount: order.totals().total,
        };

        info!(reference = %receipt.reference, "simulated payment approved");

        Ok(receipt)
    }
}
