//! Secret material that must never reach logs.

use crate::error::{ShopError, ShopResult};

/// A shared secret (API secret, signing key, password).
///
/// `Debug` and `Display` print a placeholder, so a `Secret` can sit inside
/// config structs that derive `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value; empty values are a configuration error.
    pub fn new(value: impl Into<String>, name: &str) -> ShopResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ShopError::Configuration(format!("{} is empty", name)));
        }
        Ok(Self(value))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("***")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_is_redacted() {
        let secret = Secret::new("rzp_secret_value", "RAZORPAY_KEY_SECRET").unwrap();
        assert_eq!(format!("{:?}", secret), "Secret(***)");
        assert_eq!(secret.to_string(), "***");
        assert_eq!(secret.expose(), "rzp_secret_value");
    }

    #[test]
    fn test_empty_secret_rejected() {
        let err = Secret::new("   ", "DOWNLOAD_SECRET").unwrap_err();
        assert!(matches!(err, ShopError::Configuration(msg) if msg.contains("DOWNLOAD_SECRET")));
    }
}
