//! # digicart-core
//!
//! Core types and the payment-to-download flow for digicart.
//!
//! This crate provides:
//! - `Product` and `CatalogStore` for the in-memory product catalog
//! - `PaymentVerifier` for offline verification of gateway payment signatures
//! - `AccessTokenIssuer` and `AccessTokenGate` for signed, expiring download links
//! - `OrderGateway` trait and `issue_order` for creating priced order intents
//! - `AdminAuthority` and `AdminCapability` for catalog mutation rights
//! - `ShopError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use digicart_core::{AccessTokenGate, AccessTokenIssuer, PaymentProof, PaymentVerifier};
//!
//! let verified = verifier.verify(&catalog, &proof)?;
//! let issued = issuer.issue(&verified.product_id, clock.now())?;
//!
//! // Later, on GET /download?token=...
//! let locator = gate.resolve(&issued.token, &catalog, clock.now())?;
//! // Redirect the client to `locator`
//! ```

pub mod catalog;
pub mod clock;
pub mod crypto;
pub mod error;
pub mod order;
pub mod product;
pub mod secret;
pub mod session;
pub mod token;
pub mod verify;

// Re-exports for convenience
pub use catalog::{CatalogStore, ProductLookup, ProductPatch};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use error::{ErrorKind, ShopError, ShopResult};
pub use order::{issue_order, BoxedOrderGateway, OrderGateway, OrderIntent, OrderRequest};
pub use product::{Currency, Product, PublicProduct};
pub use secret::Secret;
pub use session::{AdminAuthority, AdminCapability, AdminCredentials, DEFAULT_SESSION_TTL_SECS};
pub use token::{
    AccessClaims, AccessTokenGate, AccessTokenIssuer, IssuedToken, DEFAULT_TOKEN_TTL,
    MAX_TOKEN_TTL,
};
pub use verify::{sign_payment, PaymentProof, PaymentVerifier, VerifiedPayment};
