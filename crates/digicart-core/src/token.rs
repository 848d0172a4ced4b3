//! # Access Tokens
//!
//! Signed, self-contained download capabilities.
//!
//! A token is an HS256 JWT over `{sub: product_id, iat, exp}`, keyed with the
//! download-signing secret (never the gateway secret). The product binding is
//! inside the signed payload, so a token minted for one product cannot unlock
//! another.
//!
//! ```text
//! Issued ──(now < exp, signature intact)──> Valid ──(now >= exp)──> Expired
//!    └──(any byte altered)──> Invalid
//! ```
//!
//! There is no revocation: a token lives until `exp`.

use crate::catalog::ProductLookup;
use crate::error::{ShopError, ShopResult};
use crate::secret::Secret;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Default download link lifetime, in seconds (1 hour)
pub const DEFAULT_TOKEN_TTL: i64 = 3600;

/// Longest download link lifetime accepted from configuration, in seconds (30 days)
pub const MAX_TOKEN_TTL: i64 = 30 * 24 * 60 * 60;

/// Claims carried by a download token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Product identifier the token unlocks
    pub sub: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expires at (Unix seconds); valid strictly before this instant
    pub exp: i64,
}

/// A freshly minted token and its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Mints download tokens
pub struct AccessTokenIssuer {
    encoding_key: EncodingKey,
    ttl: Duration,
}

impl AccessTokenIssuer {
    pub fn new(download_secret: &Secret, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(download_secret.as_bytes()),
            ttl,
        }
    }

    /// Issuer with the default one-hour lifetime
    pub fn with_default_ttl(download_secret: &Secret) -> Self {
        Self::new(download_secret, Duration::seconds(DEFAULT_TOKEN_TTL))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a token bound to `product_id`, valid for `ttl` from `now`.
    pub fn issue(&self, product_id: &str, now: DateTime<Utc>) -> ShopResult<IssuedToken> {
        if product_id.is_empty() {
            return Err(ShopError::MissingField { field: "productId" });
        }

        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| ShopError::Internal("token expiry out of range".to_string()))?;
        let claims = AccessClaims {
            sub: product_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ShopError::Internal(format!("token signing failed: {}", e)))?;

        debug!(product_id, exp = claims.exp, "Issued access token");

        Ok(IssuedToken { token, expires_at })
    }
}

/// Validates download tokens and resolves them to resource locators
pub struct AccessTokenGate {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AccessTokenGate {
    pub fn new(download_secret: &Secret) -> Self {
        // Expiry is checked against the caller's clock below, with no leeway
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(download_secret.as_bytes()),
            validation,
        }
    }

    /// Check signature and expiry, returning the verified claims.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> ShopResult<AccessClaims> {
        let claims = decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                warn!(reason = %e, "Rejected access token");
                ShopError::InvalidToken
            })?
            .claims;

        if now.timestamp() >= claims.exp {
            debug!(product_id = %claims.sub, exp = claims.exp, "Access token expired");
            return Err(ShopError::TokenExpired);
        }

        Ok(claims)
    }

    /// Resolve a token to the bound product's current resource locator.
    ///
    /// The gate only vouches for access; the caller redirects to the locator.
    #[instrument(skip(self, token, catalog))]
    pub fn resolve(
        &self,
        token: &str,
        catalog: &dyn ProductLookup,
        now: DateTime<Utc>,
    ) -> ShopResult<String> {
        let claims = self.validate(token, now)?;

        let product = catalog
            .get(&claims.sub)
            .ok_or_else(|| ShopError::UnknownProduct {
                product_id: claims.sub.clone(),
            })?;

        Ok(product.url)
    }
}
