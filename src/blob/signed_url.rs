//! # Capability Signing
//!
//! Capabilities are URLs carrying an expiry and a signature over
//! `method`, `namespace`, `key`, `content_type` (uploads only) and the
//! expiry. The signature is HMAC-SHA256 keyed with the configured secret.
//! The blob endpoint recomputes the signature and compares it in constant
//! time.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::backend::CapabilityMethod;
use super::errors::{BlobError, BlobResult};

/// Fields covered by a capability signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedRequest<'a> {
    pub method: CapabilityMethod,
    pub namespace: &'a str,
    pub key: &'a str,
    pub content_type: Option<&'a str>,
    /// Unix seconds
    pub expires: i64,
}

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies capability URLs
pub struct CapabilitySigner {
    /// Keyed once, cloned per signature
    mac: HmacSha256,
}

impl std::fmt::Debug for CapabilitySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilitySigner").finish_non_exhaustive()
    }
}

impl CapabilitySigner {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            mac: HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length"),
        }
    }

    fn digest(&self, message: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(message);
        mac.finalize().into_bytes().to_vec()
    }

    /// Signature for a request
    pub fn sign(&self, request: &SignedRequest<'_>) -> String {
        let message = format!(
            "{}\n{}\n{}\n{}\n{}",
            request.method,
            request.namespace,
            request.key,
            request.content_type.unwrap_or(""),
            request.expires
        );

        URL_SAFE_NO_PAD.encode(self.digest(message.as_bytes()))
    }

    /// Verify expiry first, then the signature
    pub fn verify(
        &self,
        request: &SignedRequest<'_>,
        signature: &str,
        now: DateTime<Utc>,
    ) -> BlobResult<()> {
        if now.timestamp() > request.expires {
            return Err(BlobError::CapabilityExpired);
        }

        let expected = self.sign(request);
        if !bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) {
            return Err(BlobError::InvalidSignature);
        }

        Ok(())
    }

    /// Full capability URL served by the local blob endpoint
    pub fn to_url(&self, base_url: &str, request: &SignedRequest<'_>) -> String {
        format!(
            "{}/blob/{}/{}?method={}&expires={}&signature={}",
            base_url.trim_end_matches('/'),
            request.namespace,
            request.key,
            request.method,
            request.expires,
            self.sign(request)
        )
    }
}

/// Expiry timestamp back to a `DateTime`
pub fn expiry_from_unix(expires: i64) -> BlobResult<DateTime<Utc>> {
    Utc.timestamp_opt(expires, 0)
        .single()
        .ok_or(BlobError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn request(expires: i64) -> SignedRequest<'static> {
        SignedRequest {
            method: CapabilityMethod::Put,
            namespace: "user-bucket-abc",
            key: "uploads/o/1-x-file.txt",
            content_type: Some("text/plain"),
            expires,
        }
    }

    #[test]
    fn test_sign_and_verify() {
        let signer = CapabilitySigner::new(b"test-secret");
        let now = Utc::now();
        let req = request((now + Duration::minutes(5)).timestamp());

        let signature = signer.sign(&req);
        assert!(signer.verify(&req, &signature, now).is_ok());
    }

    #[test]
    fn test_expired_capability() {
        let signer = CapabilitySigner::new(b"test-secret");
        let now = Utc::now();
        let req = request((now - Duration::seconds(1)).timestamp());

        let signature = signer.sign(&req);
        assert_eq!(signer.verify(&req, &signature, now), Err(BlobError::CapabilityExpired));
    }

    #[test]
    fn test_tampered_fields_fail() {
        let signer = CapabilitySigner::new(b"test-secret");
        let now = Utc::now();
        let req = request((now + Duration::minutes(5)).timestamp());
        let signature = signer.sign(&req);

        let other_key = SignedRequest { key: "uploads/o/other", ..req };
        assert_eq!(signer.verify(&other_key, &signature, now), Err(BlobError::InvalidSignature));

        let as_get = SignedRequest { method: CapabilityMethod::Get, ..req };
        assert_eq!(signer.verify(&as_get, &signature, now), Err(BlobError::InvalidSignature));

        let other_type = SignedRequest { content_type: Some("image/png"), ..req };
        assert_eq!(signer.verify(&other_type, &signature, now), Err(BlobError::InvalidSignature));

        let other_secret = CapabilitySigner::new(b"another-secret");
        assert_eq!(other_secret.verify(&req, &signature, now), Err(BlobError::InvalidSignature));
    }

    #[test]
    fn test_digest_is_hmac_sha256() {
        // RFC 4231 test case 2
        let signer = CapabilitySigner::new(b"Jefe");
        let digest = signer.digest(b"what do ya want for nothing?");
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();

        assert_eq!(
            hex,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_signature_is_not_a_prefixed_hash() {
        use sha2::Digest;

        let signer = CapabilitySigner::new(b"test-secret");
        let req = request(1_700_000_000);
        let message = "PUT\nuser-bucket-abc\nuploads/o/1-x-file.txt\ntext/plain\n1700000000";

        let mut hasher = Sha256::new();
        hasher.update(b"test-secret");
        hasher.update(message.as_bytes());
        let prefixed = URL_SAFE_NO_PAD.encode(hasher.finalize());

        let signature = signer.sign(&req);
        assert_ne!(signature, prefixed);
        assert_eq!(signature, URL_SAFE_NO_PAD.encode(signer.digest(message.as_bytes())));
    }

    #[test]
    fn test_to_url() {
        let signer = CapabilitySigner::new(b"secret");
        let req = request(1_700_000_000);
        let url = signer.to_url("http://localhost:54321/", &req);

        assert!(url.starts_with("http://localhost:54321/blob/user-bucket-abc/uploads/o/1-x-file.txt?"));
        assert!(url.contains("method=PUT"));
        assert!(url.contains("expires=1700000000"));
        assert!(url.contains("signature="));
    }
}
