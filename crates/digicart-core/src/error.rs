//! # Shop Error Types
//!
//! Typed error handling for the digicart engine.
//! All core operations return `Result<T, ShopError>`.

use thiserror::Error;

/// Core error type for catalog, payment and download operations
#[derive(Debug, Error)]
pub enum ShopError {
    /// Configuration errors (missing secrets, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Required request field absent or empty
    #[error("Missing field: {field}")]
    MissingField { field: &'static str },

    /// Product not found in catalog
    #[error("Invalid SKU: {product_id}")]
    UnknownProduct { product_id: String },

    /// Payment signature did not match the gateway's keyed hash
    #[error("Signature mismatch")]
    SignatureMismatch,

    /// Download token failed signature or format checks
    #[error("Invalid access token")]
    InvalidToken,

    /// Download token is past its expiry
    #[error("Access token expired")]
    TokenExpired,

    /// Missing or invalid admin credentials/session
    #[error("Unauthorized")]
    Unauthorized,

    /// Compare-and-swap on a product lost against a concurrent edit
    #[error("Version conflict on {product_id}: expected {expected}, found {actual}")]
    VersionConflict {
        product_id: String,
        expected: u64,
        actual: u64,
    },

    /// Payment gateway API error
    #[error("Gateway error [{gateway}]: {message}")]
    Gateway { gateway: String, message: String },

    /// Network/HTTP error communicating with the gateway
    #[error("Network error: {0}")]
    Network(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse error classes, used for logging and response mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or missing input, unknown product
    Validation,
    /// Payment signature, token signature/expiry, admin credentials
    Signature,
    /// Gateway unreachable or rejected the call
    Upstream,
    /// Missing or inconsistent secrets
    Configuration,
    /// Lost a compare-and-swap
    Conflict,
    /// Everything else
    Internal,
}

impl ShopError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShopError::InvalidRequest(_)
            | ShopError::MissingField { .. }
            | ShopError::UnknownProduct { .. } => ErrorKind::Validation,
            ShopError::SignatureMismatch
            | ShopError::InvalidToken
            | ShopError::TokenExpired
            | ShopError::Unauthorized => ErrorKind::Signature,
            ShopError::Gateway { .. } | ShopError::Network(_) => ErrorKind::Upstream,
            ShopError::Configuration(_) => ErrorKind::Configuration,
            ShopError::VersionConflict { .. } => ErrorKind::Conflict,
            ShopError::Serialization(_) | ShopError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns true if the client may safely retry (with a fresh order)
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Upstream)
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ShopError::Configuration(_) => 500,
            ShopError::InvalidRequest(_) => 400,
            ShopError::MissingField { .. } => 400,
            ShopError::UnknownProduct { .. } => 400,
            ShopError::SignatureMismatch => 400,
            ShopError::InvalidToken => 401,
            ShopError::TokenExpired => 401,
            ShopError::Unauthorized => 401,
            ShopError::VersionConflict { .. } => 409,
            ShopError::Gateway { .. } => 500,
            ShopError::Network(_) => 500,
            ShopError::Serialization(_) => 500,
            ShopError::Internal(_) => 500,
        }
    }
}

/// Result type alias for shop operations
pub type ShopResult<T> = Result<T, ShopError>;
