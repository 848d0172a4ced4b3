//! # Order Intents
//!
//! Gateway-neutral order creation. A payment gateway implements
//! [`OrderGateway`]; [`issue_order`] prices the request from the catalog and
//! hands it to the gateway, returning the gateway's order reference.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            OrderGateway (trait)              │
//! │  ├── create_order()                          │
//! │  ├── gateway_name()                          │
//! │  └── public_key_id()                         │
//! └──────────────────────────────────────────────┘
//!                       ▲
//!              ┌────────┴────────┐
//!              │ RazorpayGateway │
//!              └─────────────────┘
//! ```

use crate::catalog::ProductLookup;
use crate::error::{ShopError, ShopResult};
use crate::product::Currency;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Gateway limit on receipt length
pub const MAX_RECEIPT_LEN: usize = 40;

/// A priced request to the gateway
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    /// Product being bought
    pub product_id: String,

    /// Amount in minor currency units, taken from the catalog
    pub amount: i64,

    pub currency: Currency,

    /// Caller-side reference; unique per checkout attempt
    pub receipt: String,

    /// Free-form notes forwarded to the gateway
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub notes: HashMap<String, String>,
}

impl OrderRequest {
    pub fn new(product_id: impl Into<String>, amount: i64, currency: Currency, now: DateTime<Utc>) -> Self {
        let product_id = product_id.into();
        let receipt = receipt_for(&product_id, now);
        let mut notes = HashMap::new();
        notes.insert("sku".to_string(), product_id.clone());

        Self {
            product_id,
            amount,
            currency,
            receipt,
            notes,
        }
    }

    /// Builder: add a note
    pub fn with_note(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.notes.insert(key.into(), value.into());
        self
    }
}

/// `rcpt_<product>_<millis>`, cut to the gateway's receipt limit
fn receipt_for(product_id: &str, now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().to_string();
    let budget = MAX_RECEIPT_LEN.saturating_sub("rcpt__".len() + millis.len());
    let product: String = product_id.chars().take(budget).collect();
    format!("rcpt_{}_{}", product, millis)
}

/// A gateway-issued order reference for a priced intent to pay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderIntent {
    /// Gateway order identifier (opaque)
    pub order_ref: String,
    pub product_id: String,
    pub amount: i64,
    pub currency: Currency,
    pub receipt: String,
    pub created_at: DateTime<Utc>,
}

/// Payment gateway seam for order creation.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Ask the gateway to mint an order reference for this request.
    async fn create_order(&self, request: &OrderRequest) -> ShopResult<OrderIntent>;

    /// Gateway name (for logging)
    fn gateway_name(&self) -> &'static str;

    /// Public key identifier the client checkout widget needs
    fn public_key_id(&self) -> &str;
}

/// Type alias for a shared gateway (dynamic dispatch)
pub type BoxedOrderGateway = Arc<dyn OrderGateway>;

/// Create an order intent for `product_id` at its current catalog price.
#[instrument(skip(catalog, gateway, now), fields(gateway = gateway.gateway_name()))]
pub async fn issue_order(
    catalog: &dyn ProductLookup,
    gateway: &dyn OrderGateway,
    product_id: &str,
    currency: Currency,
    now: DateTime<Utc>,
) -> ShopResult<OrderIntent> {
    if product_id.trim().is_empty() {
        return Err(ShopError::MissingField { field: "productId" });
    }

    let product = catalog
        .get(product_id)
        .ok_or_else(|| ShopError::UnknownProduct {
            product_id: product_id.to_string(),
        })?;

    let request = OrderRequest::new(&product.id, product.price, currency, now);
    let intent = gateway.create_order(&request).await?;

    info!(
        order_ref = %intent.order_ref,
        amount = intent.amount,
        currency = %intent.currency,
        "Order created"
    );

    Ok(intent)
}
