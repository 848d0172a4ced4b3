//! # digicart-api
//!
//! HTTP API layer for digicart.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Storefront endpoints for ordering and payment verification
//! - The token-gated download redirect
//! - Cookie-session admin pages for catalog edits
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/api/products` | List products |
//! | POST | `/api/order` | Create gateway order |
//! | POST | `/api/verify` | Verify payment, issue download link |
//! | GET | `/download` | Redirect to purchased resource |
//! | GET | `/admin` | Catalog dashboard |
//! | POST | `/update-price` | Change a price |
//! | POST | `/add-product` | Add a product |

pub mod admin;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AdminConfig, AppConfig, AppState};
