//! # Request Handlers
//!
//! Axum request handlers for the storefront API: order creation, payment
//! verification and the protected download redirect.

use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use digicart_core::{issue_order, Currency, ErrorKind, PaymentProof, PublicProduct, ShopError};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

/// Body of every 401 from the download gate
pub const DOWNLOAD_DENIED: &str = "Link expired or invalid";

// =============================================================================
// Request/Response Types
// =============================================================================

/// Create order request
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Product to buy
    #[serde(default, alias = "sku")]
    pub product_id: Option<String>,
}

/// Create order response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub ok: bool,
    /// Gateway order reference
    pub order_ref: String,
    /// Gateway public key id for the checkout widget
    pub public_key_id: String,
    /// Amount in minor units
    pub amount: i64,
    pub currency: Currency,
    pub product_id: String,
}

/// Verify payment request (gateway field names accepted as aliases)
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    #[serde(default, alias = "sku")]
    pub product_id: Option<String>,
    #[serde(default, alias = "razorpay_order_id")]
    pub order_ref: Option<String>,
    #[serde(default, alias = "razorpay_payment_id")]
    pub payment_ref: Option<String>,
    #[serde(default, alias = "razorpay_signature")]
    pub signature: Option<String>,
}

impl From<VerifyPaymentRequest> for PaymentProof {
    fn from(request: VerifyPaymentRequest) -> Self {
        PaymentProof {
            product_id: request.product_id.unwrap_or_default(),
            order_ref: request.order_ref.unwrap_or_default(),
            payment_ref: request.payment_ref.unwrap_or_default(),
            signature: request.signature.unwrap_or_default(),
        }
    }
}

/// Verify payment response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentResponse {
    pub ok: bool,
    /// Link to `/download` carrying the signed token
    pub download_url: String,
    /// RFC 3339 expiry of the link
    pub expires_at: String,
}

/// Download query string
#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    #[serde(default)]
    pub token: Option<String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: error.into(),
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a core error to a JSON error; server-side failures get `fallback` instead of detail.
fn shop_error_to_response(err: ShopError, fallback: &str) -> ApiError {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = if status.is_server_error() {
        fallback.to_string()
    } else {
        err.to_string()
    };
    (status, Json(ErrorResponse::new(message)))
}

fn bad_json(rejection: JsonRejection) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(format!("Invalid JSON body: {}", rejection.body_text()))),
    )
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "digicart",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Public product list (no resource locators)
pub async fn list_products(State(state): State<AppState>) -> impl IntoResponse {
    let products: Vec<PublicProduct> = state
        .catalog
        .list_all()
        .iter()
        .map(|p| p.public())
        .collect();
    Json(serde_json::json!({
        "products": products,
        "count": products.len(),
        "currency": state.config.currency,
    }))
}

/// Create a gateway order for one product at its catalog price
#[instrument(skip(state, payload))]
pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<Json<CreateOrderResponse>, ApiError> {
    let Json(request) = payload.map_err(bad_json)?;
    let product_id = request.product_id.unwrap_or_default();

    let intent = issue_order(
        state.catalog.as_ref(),
        state.gateway.as_ref(),
        &product_id,
        state.config.currency,
        state.now(),
    )
    .await
    .map_err(|e| {
        if e.kind() == ErrorKind::Validation {
            warn!("Order rejected: {}", e);
        } else {
            error!("Order creation failed: {}", e);
        }
        shop_error_to_response(e, "Order creation failed")
    })?;

    Ok(Json(CreateOrderResponse {
        ok: true,
        order_ref: intent.order_ref,
        public_key_id: state.gateway.public_key_id().to_string(),
        amount: intent.amount,
        currency: intent.currency,
        product_id: intent.product_id,
    }))
}

/// Verify a payment signature and hand back a signed download link
#[instrument(skip(state, payload))]
pub async fn verify_payment(
    State(state): State<AppState>,
    payload: Result<Json<VerifyPaymentRequest>, JsonRejection>,
) -> Result<Json<VerifyPaymentResponse>, ApiError> {
    let Json(request) = payload.map_err(bad_json)?;
    let proof = PaymentProof::from(request);

    let verified = state
        .verifier
        .verify(state.catalog.as_ref(), &proof)
        .map_err(|e| {
            warn!(product_id = %proof.product_id, order_ref = %proof.order_ref, "Verification failed: {}", e);
            shop_error_to_response(e, "Verification failed")
        })?;

    let issued = state
        .issuer
        .issue(&verified.product_id, state.now())
        .map_err(|e| {
            error!("Token issuance failed: {}", e);
            shop_error_to_response(e, "Verification failed")
        })?;

    info!(
        product_id = %verified.product_id,
        order_ref = %verified.order_ref,
        payment_ref = %verified.payment_ref,
        "Payment verified, download link issued"
    );

    Ok(Json(VerifyPaymentResponse {
        ok: true,
        download_url: state.download_url(&issued.token),
        expires_at: issued.expires_at.to_rfc3339(),
    }))
}

/// Protected download: redirect to the product's locator if the token is good
#[instrument(skip(state, query))]
pub async fn download(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Response {
    let Some(token) = query.token.filter(|t| !t.is_empty()) else {
        return (StatusCode::UNAUTHORIZED, DOWNLOAD_DENIED).into_response();
    };

    match state.gate.resolve(&token, state.catalog.as_ref(), state.now()) {
        Ok(url) => {
            info!("Download granted");
            (
                StatusCode::FOUND,
                [
                    (header::LOCATION, url),
                    (header::CACHE_CONTROL, "no-store".to_string()),
                ],
            )
                .into_response()
        }
        Err(ShopError::UnknownProduct { product_id }) => {
            warn!(%product_id, "Token for a product no longer in the catalog");
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
        Err(e) => {
            info!("Download denied: {}", e);
            (StatusCode::UNAUTHORIZED, DOWNLOAD_DENIED).into_response()
        }
    }
}
