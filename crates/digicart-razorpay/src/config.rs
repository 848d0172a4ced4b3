//! # Razorpay Configuration
//!
//! Configuration management for the Razorpay integration.
//! Credentials are loaded from environment variables; there are no defaults.

use digicart_core::{Secret, ShopError};
use std::env;

pub const DEFAULT_API_BASE_URL: &str = "https://api.razorpay.com";

/// Razorpay API configuration
#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    /// Public key id (rzp_test_... or rzp_live_...), shared with the checkout widget
    pub key_id: String,

    /// API secret: authenticates API calls and keys payment signatures
    pub key_secret: Secret,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,
}

impl RazorpayConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `RAZORPAY_KEY_ID`
    /// - `RAZORPAY_KEY_SECRET`
    ///
    /// Optional:
    /// - `RAZORPAY_API_BASE` (defaults to the public API)
    pub fn from_env() -> Result<Self, ShopError> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ShopError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let key_id = var("RAZORPAY_KEY_ID")
            .ok_or_else(|| ShopError::Configuration("RAZORPAY_KEY_ID not set".to_string()))?;

        let key_secret = var("RAZORPAY_KEY_SECRET")
            .ok_or_else(|| ShopError::Configuration("RAZORPAY_KEY_SECRET not set".to_string()))
            .and_then(|v| Secret::new(v, "RAZORPAY_KEY_SECRET"))?;

        let api_base_url = var("RAZORPAY_API_BASE")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        Ok(Self {
            key_id,
            key_secret,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create config with explicit values (for testing)
    pub fn new(key_id: impl Into<String>, key_secret: Secret) -> Self {
        Self {
            key_id: key_id.into(),
            key_secret,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Check if using test keys
    pub fn is_test_mode(&self) -> bool {
        self.key_id.starts_with("rzp_test_")
    }

    /// Check if using live keys
    pub fn is_live_mode(&self) -> bool {
        self.key_id.starts_with("rzp_live_")
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}
