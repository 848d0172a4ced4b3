//! # Admin Sessions
//!
//! Admin authentication as an explicit capability.
//!
//! A successful credential check yields a signed session token (HS256 JWT,
//! `role = "admin"`). Presenting that token to [`AdminAuthority::authorize`]
//! yields an [`AdminCapability`], which catalog mutations require as an
//! argument. Nothing outside this module can construct a capability.

use crate::crypto::digest_eq;
use crate::error::{ShopError, ShopResult};
use crate::secret::Secret;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Default admin session lifetime, in seconds (8 hours)
pub const DEFAULT_SESSION_TTL_SECS: i64 = 8 * 60 * 60;

const ADMIN_ROLE: &str = "admin";

/// Externally supplied admin login
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: Secret,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    role: String,
    iat: i64,
    exp: i64,
}

/// Proof that the caller holds a live admin session.
#[derive(Debug, Clone)]
pub struct AdminCapability {
    username: String,
    expires_at: DateTime<Utc>,
}

impl AdminCapability {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self {
            username: "test-admin".to_string(),
            expires_at: Utc::now() + Duration::seconds(DEFAULT_SESSION_TTL_SECS),
        }
    }
}

/// Checks admin credentials and mints/validates session tokens
pub struct AdminAuthority {
    credentials: AdminCredentials,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl AdminAuthority {
    pub fn new(credentials: AdminCredentials, session_secret: &Secret, ttl: Duration) -> Self {
        Self {
            credentials,
            encoding_key: EncodingKey::from_secret(session_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(session_secret.as_bytes()),
            ttl,
        }
    }

    /// Check credentials and mint a session token.
    pub fn login(&self, username: &str, password: &str, now: DateTime<Utc>) -> ShopResult<String> {
        // Evaluate both comparisons so a wrong username costs the same as a wrong password
        let user_ok = digest_eq(username, &self.credentials.username);
        let pass_ok = digest_eq(password, self.credentials.password.expose());
        if !(user_ok & pass_ok) {
            warn!("Rejected admin login");
            return Err(ShopError::Unauthorized);
        }

        let claims = SessionClaims {
            sub: self.credentials.username.clone(),
            role: ADMIN_ROLE.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ShopError::Internal(format!("session signing failed: {}", e)))?;

        info!(admin = %claims.sub, "Admin session started");
        Ok(token)
    }

    /// Turn a presented session token into a capability.
    pub fn authorize(&self, token: &str, now: DateTime<Utc>) -> ShopResult<AdminCapability> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|_| ShopError::Unauthorized)?
            .claims;

        if claims.role != ADMIN_ROLE || now.timestamp() >= claims.exp {
            return Err(ShopError::Unauthorized);
        }

        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(ShopError::Unauthorized)?;

        Ok(AdminCapability {
            username: claims.sub,
            expires_at,
        })
    }

    pub fn session_ttl(&self) -> Duration {
        self.ttl
    }
}

impl std::fmt::Debug for AdminAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminAuthority")
            .field("username", &self.credentials.username)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authority() -> AdminAuthority {
        AdminAuthority::new(
            AdminCredentials {
                username: "seller".to_string(),
                password: Secret::new("correct horse", "ADMIN_PASSWORD").unwrap(),
            },
            &Secret::new("session-secret", "SESSION_SECRET").unwrap(),
            Duration::seconds(DEFAULT_SESSION_TTL_SECS),
        )
    }

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_login_and_authorize() {
        let authority = authority();
        let token = authority.login("seller", "correct horse", t0()).unwrap();

        let cap = authority.authorize(&token, t0() + Duration::minutes(5)).unwrap();
        assert_eq!(cap.username(), "seller");
        assert_eq!(cap.expires_at(), t0() + Duration::hours(8));
    }

    #[test]
    fn test_wrong_credentials() {
        let authority = authority();
        assert!(matches!(
            authority.login("seller", "wrong", t0()),
            Err(ShopError::Unauthorized)
        ));
        assert!(matches!(
            authority.login("someone", "correct horse", t0()),
            Err(ShopError::Unauthorized)
        ));
    }

    #[test]
    fn test_session_expires() {
        let authority = authority();
        let token = authority.login("seller", "correct horse", t0()).unwrap();

        assert!(matches!(
            authority.authorize(&token, t0() + Duration::hours(8)),
            Err(ShopError::Unauthorized)
        ));
    }

    #[test]
    fn test_foreign_session_rejected() {
        let other = AdminAuthority::new(
            AdminCredentials {
                username: "seller".to_string(),
                password: Secret::new("correct horse", "ADMIN_PASSWORD").unwrap(),
            },
            &Secret::new("another-secret", "SESSION_SECRET").unwrap(),
            Duration::seconds(DEFAULT_SESSION_TTL_SECS),
        );
        let token = other.login("seller", "correct horse", t0()).unwrap();

        assert!(authority().authorize(&token, t0()).is_err());
        assert!(authority().authorize("not-a-token", t0()).is_err());
    }
}
