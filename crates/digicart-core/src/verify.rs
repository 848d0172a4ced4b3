//! # Payment Verification
//!
//! Offline check that an (order, payment, signature) triple was produced by
//! the gateway for the stated order.
//!
//! ```text
//! expected = hex(HMAC-SHA256(gateway_secret, order_ref + "|" + payment_ref))
//! ```
//!
//! The supplied signature is hex-decoded and checked with `Mac::verify_slice`,
//! which compares in constant time. No network call is made and nothing is
//! retained between calls.

use crate::catalog::ProductLookup;
use crate::crypto::{hmac_sha256, hmac_sha256_hex};
use crate::error::{ShopError, ShopResult};
use crate::secret::Secret;
use hmac::Mac;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Identifiers and signature returned to the client by the gateway after payment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentProof {
    pub product_id: String,
    pub order_ref: String,
    pub payment_ref: String,
    pub signature: String,
}

/// A payment whose signature checked out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedPayment {
    pub product_id: String,
    pub order_ref: String,
    pub payment_ref: String,
}

/// Compute the gateway signature for an order/payment pair (lower-case hex).
pub fn sign_payment(gateway_secret: &Secret, order_ref: &str, payment_ref: &str) -> ShopResult<String> {
    hmac_sha256_hex(gateway_secret.as_bytes(), &signed_message(order_ref, payment_ref))
}

fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn signed_message(order_ref: &str, payment_ref: &str) -> String {
    format!("{}|{}", order_ref, payment_ref)
}

/// Verifies gateway payment signatures with the gateway API secret
#[derive(Debug, Clone)]
pub struct PaymentVerifier {
    gateway_secret: Secret,
}

impl PaymentVerifier {
    pub fn new(gateway_secret: Secret) -> Self {
        Self { gateway_secret }
    }

    /// Verify a payment proof against the catalog and the gateway secret.
    ///
    /// Check order: product id present, product known, refs present, signature.
    /// An unknown product is reported as such whatever the signature.
    #[instrument(skip(self, catalog, proof), fields(product_id = %proof.product_id, order_ref = %proof.order_ref))]
    pub fn verify(
        &self,
        catalog: &dyn ProductLookup,
        proof: &PaymentProof,
    ) -> ShopResult<VerifiedPayment> {
        if proof.product_id.trim().is_empty() {
            return Err(ShopError::MissingField { field: "productId" });
        }

        if catalog.get(&proof.product_id).is_none() {
            return Err(ShopError::UnknownProduct {
                product_id: proof.product_id.clone(),
            });
        }

        if proof.order_ref.is_empty() {
            return Err(ShopError::MissingField { field: "orderRef" });
        }
        if proof.payment_ref.is_empty() {
            return Err(ShopError::MissingField { field: "paymentRef" });
        }

        // The gateway emits lower-case hex; any other spelling is not its signature
        if !is_lower_hex(&proof.signature) {
            warn!("Payment signature is not lower-case hex");
            return Err(ShopError::SignatureMismatch);
        }
        let supplied = hex::decode(&proof.signature).map_err(|_| {
            warn!("Payment signature is not valid hex");
            ShopError::SignatureMismatch
        })?;

        let mut mac = hmac_sha256(self.gateway_secret.as_bytes())?;
        mac.update(signed_message(&proof.order_ref, &proof.payment_ref).as_bytes());
        mac.verify_slice(&supplied).map_err(|_| {
            warn!("Payment signature mismatch");
            ShopError::SignatureMismatch
        })?;

        debug!("Payment signature verified");

        Ok(VerifiedPayment {
            product_id: proof.product_id.clone(),
            order_ref: proof.order_ref.clone(),
            payment_ref: proof.payment_ref.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogStore;
    use crate::product::Product;

    fn secret() -> Secret {
        Secret::new("rzp_test_secret", "RAZORPAY_KEY_SECRET").unwrap()
    }

    fn catalog() -> CatalogStore {
        CatalogStore::seed([Product::new(
            "eb-js-beg",
            "JavaScript for Beginners",
            100,
            "https://files.test/js",
        )])
        .unwrap()
    }

    fn proof(order_ref: &str, payment_ref: &str) -> PaymentProof {
        PaymentProof {
            product_id: "eb-js-beg".to_string(),
            order_ref: order_ref.to_string(),
            payment_ref: payment_ref.to_string(),
            signature: sign_payment(&secret(), order_ref, payment_ref).unwrap(),
        }
    }

    /// Flip the lowest bit of the character at `index`
    fn flip_bit(s: &str, index: usize) -> String {
        s.char_indices()
            .map(|(i, c)| if i == index { ((c as u8) ^ 1) as char } else { c })
            .collect()
    }

    #[test]
    fn test_valid_signature() {
        let verifier = PaymentVerifier::new(secret());
        let verified = verifier
            .verify(&catalog(), &proof("order_Abc123", "pay_Xyz789"))
            .unwrap();

        assert_eq!(verified.product_id, "eb-js-beg");
        assert_eq!(verified.order_ref, "order_Abc123");
        assert_eq!(verified.payment_ref, "pay_Xyz789");
    }

    #[test]
    fn test_signature_matches_known_vector() {
        let sig = sign_payment(&secret(), "order_Abc123", "pay_Xyz789").unwrap();
        let expected = hmac_sha256_hex(b"rzp_test_secret", "order_Abc123|pay_Xyz789").unwrap();
        assert_eq!(sig, expected);
        assert_eq!(sig.len(), 64);
    }

    #[test]
    fn test_non_canonical_hex_rejected() {
        let verifier = PaymentVerifier::new(secret());
        let good = proof("order_Abc123", "pay_Xyz789");

        for sig in [
            good.signature.to_uppercase(),
            format!(" {}", good.signature),
            format!("{}\n", good.signature),
        ] {
            let mut p = good.clone();
            p.signature = sig;
            assert!(matches!(
                verifier.verify(&catalog(), &p),
                Err(ShopError::SignatureMismatch)
            ));
        }
    }

    #[test]
    fn test_single_bit_mutations_rejected() {
        let verifier = PaymentVerifier::new(secret());
        let catalog = catalog();
        let good = proof("order_Abc123", "pay_Xyz789");

        for i in 0..good.signature.len() {
            let mut p = good.clone();
            p.signature = flip_bit(&good.signature, i);
            assert!(
                matches!(verifier.verify(&catalog, &p), Err(ShopError::SignatureMismatch)),
                "signature mutation at {} accepted",
                i
            );
        }

        for i in 0..good.order_ref.len() {
            let mut p = good.clone();
            p.order_ref = flip_bit(&good.order_ref, i);
            assert!(matches!(
                verifier.verify(&catalog, &p),
                Err(ShopError::SignatureMismatch)
            ));
        }

        for i in 0..good.payment_ref.len() {
            let mut p = good.clone();
            p.payment_ref = flip_bit(&good.payment_ref, i);
            assert!(matches!(
                verifier.verify(&catalog, &p),
                Err(ShopError::SignatureMismatch)
            ));
        }
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let verifier = PaymentVerifier::new(Secret::new("other", "RAZORPAY_KEY_SECRET").unwrap());
        assert!(matches!(
            verifier.verify(&catalog(), &proof("order_1", "pay_1")),
            Err(ShopError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_unknown_product_regardless_of_signature() {
        let verifier = PaymentVerifier::new(secret());
        let catalog = catalog();

        let mut p = proof("order_1", "pay_1");
        p.product_id = "no-such-sku".to_string();
        assert!(matches!(
            verifier.verify(&catalog, &p),
            Err(ShopError::UnknownProduct { .. })
        ));

        p.signature = "garbage".to_string();
        p.order_ref.clear();
        assert!(matches!(
            verifier.verify(&catalog, &p),
            Err(ShopError::UnknownProduct { .. })
        ));
    }

    #[test]
    fn test_missing_fields() {
        let verifier = PaymentVerifier::new(secret());
        let catalog = catalog();

        let mut p = proof("order_1", "pay_1");
        p.product_id.clear();
        assert!(matches!(
            verifier.verify(&catalog, &p),
            Err(ShopError::MissingField { field: "productId" })
        ));

        let mut p = proof("order_1", "pay_1");
        p.order_ref.clear();
        assert!(matches!(
            verifier.verify(&catalog, &p),
            Err(ShopError::MissingField { field: "orderRef" })
        ));

        let mut p = proof("order_1", "pay_1");
        p.payment_ref.clear();
        assert!(matches!(
            verifier.verify(&catalog, &p),
            Err(ShopError::MissingField { field: "paymentRef" })
        ));
    }

    #[test]
    fn test_malformed_or_truncated_signature() {
        let verifier = PaymentVerifier::new(secret());
        let catalog = catalog();
        let good = proof("order_1", "pay_1");
        let extended = format!("{}00", good.signature);

        for bad in ["", "zz", &good.signature[..62], extended.as_str()] {
            let mut p = good.clone();
            p.signature = bad.to_string();
            assert!(matches!(
                verifier.verify(&catalog, &p),
                Err(ShopError::SignatureMismatch)
            ));
        }
    }
}
