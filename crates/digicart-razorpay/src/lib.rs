//! # digicart-razorpay
//!
//! Razorpay order gateway for digicart.
//!
//! Razorpay's standard checkout works in two halves:
//!
//! 1. **Server creates an order** (`POST /v1/orders`) priced from the catalog.
//!    This crate's [`RazorpayGateway`] does that through the
//!    [`OrderGateway`](digicart_core::OrderGateway) trait.
//! 2. **Client pays in the checkout widget** and receives
//!    `razorpay_order_id`, `razorpay_payment_id` and `razorpay_signature`,
//!    which the server verifies offline with
//!    [`PaymentVerifier`](digicart_core::PaymentVerifier) keyed by the same
//!    API secret.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use digicart_razorpay::RazorpayGateway;
//! use digicart_core::{issue_order, Currency};
//!
//! let gateway = RazorpayGateway::from_env()?;
//! let intent = issue_order(&catalog, &gateway, "eb-js-beg", Currency::INR, Utc::now()).await?;
//!
//! // Hand intent.order_ref and gateway.public_key_id() to the checkout widget
//! ```

pub mod config;
pub mod orders;

// Re-exports
pub use config::RazorpayConfig;
pub use orders::RazorpayGateway;
