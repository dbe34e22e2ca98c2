//! Burka Cart
//!
//! Headless shopping cart page for the Burka storefront: cart lines with editable quantities, a
//! vendor discount, a simulated checkout and a PDF invoice.
//!
//! [`page::CartPage`] is the entry point. It reads the shared cart through [`store::CartStore`],
//! talks to the backend through [`api::StorefrontApi`], takes payment through
//! [`payment::PaymentGateway`] and renders into [`view::CartPageView`].

pub mod api;
pub mod checkout;
pub mod ids;
pub mod invoice;
pub mod items;
pub mod money;
pub mod order;
pub mod page;
pub mod payment;
pub mod pricing;
pub mod products;
pub mod quantities;
pub mod render;
pub mod store;
pub mod vendors;
pub mod view;
