//! Signature handling for inbound platform webhooks and the admin API.
//!
//! The commerce platform signs every webhook delivery with the tenant's
//! webhook secret. The wire format for the header is:
//!
//! ```text
//! X-Shopify-Hmac-Sha256: {base64(HMAC-SHA256(raw_body, webhook_secret))}
//! ```
//!
//! The HMAC is computed over the raw body bytes exactly as delivered, so the
//! body must be verified before it is parsed.

/// Header carrying the base64 HMAC of the raw webhook body.
pub const HMAC_HEADER: &str = "X-Shopify-Hmac-Sha256";

/// Header carrying the webhook topic (`orders/fulfilled`, `ORDERS_FULFILLED`, ...).
pub const TOPIC_HEADER: &str = "X-Shopify-Topic";

/// Header carrying the tenant's shop domain.
pub const SHOP_DOMAIN_HEADER: &str = "X-Shopify-Shop-Domain";

/// Header carrying the platform's delivery id (logged, not used for dedup).
pub const WEBHOOK_ID_HEADER: &str = "X-Shopify-Webhook-Id";

/// Header name for admin API authentication (plaintext secret).
pub const ADMIN_AUTH_HEADER: &str = "Invl-Admin-Authorization";

/// Errors produced by signature operations.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid base64 encoding")]
    InvalidBase64,
    #[error("invalid signature")]
    SignatureMismatch,
}

impl From<ring::error::Unspecified> for SignatureError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::SignatureMismatch
    }
}

fn key(secret: &[u8]) -> ring::hmac::Key {
    ring::hmac::Key::new(ring::hmac::HMAC_SHA256, secret)
}

/// Compute the header value the platform would send for `body`.
///
/// Used by the admin client and by tests to produce deliveries.
pub fn sign_webhook(body: &[u8], secret: &[u8]) -> String {
    let tag = ring::hmac::sign(&key(secret), body);
    fast32::base64::RFC4648.encode(tag.as_ref())
}

/// Verify a webhook delivery against its `X-Shopify-Hmac-Sha256` header.
///
/// The comparison is constant-time (delegated to `ring`).
pub fn verify_webhook(body: &[u8], header_value: &str, secret: &[u8]) -> Result<(), SignatureError> {
    let expected = fast32::base64::RFC4648
        .decode_str(header_value.trim())
        .map_err(|_| SignatureError::InvalidBase64)?;
    ring::hmac::verify(&key(secret), body, &expected)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc4231_vector() {
        let header = sign_webhook(b"what do ya want for nothing?", b"Jefe");
        assert_eq!(header, "W9zBRr9gdU5qBCQmCJV1x1oAPwidJzmDnexYuWTsOEM=");
    }

    #[test]
    fn test_verify_round_trip_and_tamper() {
        let body = br#"{"inventory_item_id":1,"location_id":2,"available":7}"#;
        let header = sign_webhook(body, b"shh");

        assert!(verify_webhook(body, &header, b"shh").is_ok());
        assert!(matches!(
            verify_webhook(body, &header, b"other"),
            Err(SignatureError::SignatureMismatch)
        ));
        assert!(matches!(
            verify_webhook(b"{}", &header, b"shh"),
            Err(SignatureError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_invalid_base64() {
        assert!(matches!(
            verify_webhook(b"{}", "not base64!!", b"shh"),
            Err(SignatureError::InvalidBase64)
        ));
    }
}
