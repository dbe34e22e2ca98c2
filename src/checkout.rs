//! Checkout
//!
//! Checkout modal state machine:
//!
//! ```text
//! Closed --open--> Open --confirm--> Processing --approved--> Succeeded --finish--> Done
//!   ^               |                    |
//!   +----close------+ <------declined----+
//! ```
//!
//! `Done` is terminal: the modal is closed and the page only offers the invoice from then on.

use std::{fmt, time::Duration};

use thiserror::Error;

use crate::{pricing::PricingError, vendors::VendorId};

/// Pause between a successful payment and the modal closing.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Checkout modal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckoutState {
    /// Modal closed, checkout not yet done.
    #[default]
    Closed,

    /// Modal open, waiting for confirmation.
    Open,

    /// Payment in progress; cannot be cancelled.
    Processing,

    /// Payment approved; cart being cleared.
    Succeeded,

    /// Modal closed after a successful payment.
    Done,
}

/// Events that move the checkout state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutAction {
    /// Open the modal.
    Open,

    /// Cancel and close the modal.
    Close,

    /// Confirm the payment.
    Confirm,

    /// The gateway approved the payment.
    Approve,

    /// The gateway rejected the payment.
    Decline,

    /// Clearing is finished; close the modal for good.
    Finish,
}

/// Checkout errors.
#[derive(Debug, Error, PartialEq)]
pub enum CheckoutError {
    /// The action isn't allowed in the current state.
    #[error("cannot {action} while checkout is {state}")]
    InvalidTransition {
        /// State the machine was in
        state: CheckoutState,

        /// Action that was rejected
        action: CheckoutAction,
    },

    /// Checkout needs a vendor to be selected.
    #[error("select a vendor before checking out")]
    VendorRequired,

    /// The selected vendor isn't one of the loaded vendors.
    #[error("vendor {0} is not available")]
    UnknownVendor(VendorId),

    /// There is nothing in the cart to check out.
    #[error("cart is empty")]
    EmptyCart,

    /// The order couldn't be priced.
    #[error("failed to price order")]
    Pricing(#[from] PricingError),
}

impl CheckoutState {
    /// Apply `action`, returning the next state.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] if `action` isn't valid from this state.
    pub fn apply(self, action: CheckoutAction) -> Result<Self, CheckoutError> {
        use CheckoutAction as A;
        use CheckoutState as S;

        match (self, action) {
            (S::Closed, A::Open) | (S::Processing, A::Decline) => Ok(S::Open),
            (S::Open, A::Close) => Ok(S::Closed),
            (S::Open, A::Confirm) => Ok(S::Processing),
            (S::Processing, A::Approve) => Ok(S::Succeeded),
            (S::Succeeded, A::Finish) => Ok(S::Done),
            (state, action) => Err(CheckoutError::InvalidTransition { state, action }),
        }
    }

    /// Whether the modal is showing.
    pub fn is_modal_open(self) -> bool {
        matches!(self, Self::Open | Self::Processing | Self::Succeeded)
    }

    /// Whether checkout has completed.
    pub fn is_done(self) -> bool {
        self == Self::Done
    }

    /// Whether the modal can be dismissed.
    pub fn can_cancel(self) -> bool {
        self == Self::Open
    }
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Done => "done",
        })
    }
}

impl fmt::Display for CheckoutAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Confirm => "confirm",
            Self::Approve => "approve",
            Self::Decline => "decline",
            Self::Finish => "finish",
        })
    }
}

/// Fixed delays in the checkout flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutTimings {
    /// Pause after the cart is cleared before the modal closes
    pub settle_delay: Duration,
}

impl Default for CheckoutTimings {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}
