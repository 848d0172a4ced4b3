//! # Razorpay Orders
//!
//! Implementation of the Razorpay Orders API (`POST /v1/orders`).
//! Every checkout attempt creates a fresh order with its own receipt.

use crate::config::RazorpayConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use digicart_core::{Currency, OrderGateway, OrderIntent, OrderRequest, ShopError, ShopResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, error, info, instrument};

const GATEWAY: &str = "razorpay";

/// Razorpay order gateway
pub struct RazorpayGateway {
    config: RazorpayConfig,
    client: Client,
}

impl RazorpayGateway {
    /// Create a new Razorpay gateway
    pub fn new(config: RazorpayConfig) -> ShopResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ShopError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> ShopResult<Self> {
        let config = RazorpayConfig::from_env()?;
        Self::new(config)
    }

    pub fn config(&self) -> &RazorpayConfig {
        &self.config
    }
}

#[async_trait]
impl OrderGateway for RazorpayGateway {
    #[instrument(skip(self, request), fields(product_id = %request.product_id, receipt = %request.receipt))]
    async fn create_order(&self, request: &OrderRequest) -> ShopResult<OrderIntent> {
        if request.amount <= 0 {
            return Err(ShopError::InvalidRequest(
                "Order amount must be positive".to_string(),
            ));
        }

        let body = RazorpayOrderRequest {
            amount: request.amount,
            currency: request.currency.as_str(),
            receipt: &request.receipt,
            notes: &request.notes,
        };

        debug!(
            "Creating Razorpay order: amount={}, currency={}",
            body.amount, body.currency
        );

        let url = format!("{}/v1/orders", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.expose()))
            .json(&body)
            .send()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("Razorpay API error: status={}, body={}", status, text);

            if let Ok(error_response) = serde_json::from_str::<RazorpayErrorResponse>(&text) {
                return Err(ShopError::Gateway {
                    gateway: GATEWAY.to_string(),
                    message: error_response.error.description,
                });
            }

            return Err(ShopError::Gateway {
                gateway: GATEWAY.to_string(),
                message: format!("HTTP {}: {}", status, text),
            });
        }

        let order: RazorpayOrderResponse = serde_json::from_str(&text).map_err(|e| {
            ShopError::Serialization(format!("Failed to parse Razorpay response: {}", e))
        })?;

        if order.amount != request.amount {
            return Err(ShopError::Gateway {
                gateway: GATEWAY.to_string(),
                message: format!(
                    "order amount {} does not match requested {}",
                    order.amount, request.amount
                ),
            });
        }

        let currency: Currency = order.currency.parse().map_err(|e| ShopError::Gateway {
            gateway: GATEWAY.to_string(),
            message: e,
        })?;

        info!(
            "Created Razorpay order: id={}, status={}",
            order.id, order.status
        );

        let created_at = order
            .created_at
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .unwrap_or_else(Utc::now);

        Ok(OrderIntent {
            order_ref: order.id,
            product_id: request.product_id.clone(),
            amount: order.amount,
            currency,
            receipt: order.receipt.unwrap_or_else(|| request.receipt.clone()),
            created_at,
        })
    }

    fn gateway_name(&self) -> &'static str {
        GATEWAY
    }

    fn public_key_id(&self) -> &str {
        &self.config.key_id
    }
}

// =============================================================================
// Razorpay API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct RazorpayOrderRequest<'a> {
    amount: i64,
    currency: &'static str,
    receipt: &'a str,
    notes: &'a HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RazorpayOrderResponse {
    id: String,
    amount: i64,
    currency: String,
    #[serde(default)]
    receipt: Option<String>,
    #[serde(default)]
    status: String,
    #[serde(default)]
    created_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorResponse {
    error: RazorpayError,
}

#[derive(Debug, Deserialize)]
struct RazorpayError {
    description: String,
}
