// Copyright (c) 2025 - Cowboy AI, Inc.

//! JumpServer access-key request signing
//!
//! JumpServer authenticates API keys with HTTP Signatures
//! (draft-cavage-http-signatures) using `hmac-sha256` over the request
//! target, the `accept` header and the `date` header:
//!
//! ```text
//! (request-target): get /api/v1/assets/nodes/
//! accept: application/json
//! date: Tue, 04 Mar 2025 05:06:07 GMT
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::store::{StoreError, StoreResult};

type HmacSha256 = Hmac<Sha256>;

/// Headers covered by the signature, in signing order
pub const SIGNED_HEADERS: &str = "(request-target) accept date";

/// Accept header sent (and signed) on every request
pub const ACCEPT: &str = "application/json";

/// `Date` header value in RFC 1123 form
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Signs requests with an access key pair
#[derive(Clone)]
pub struct RequestSigner {
    key_id: String,
    secret: String,
}

impl RequestSigner {
    pub fn new(key_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            secret: secret.into(),
        }
    }

    /// String that gets signed
    pub fn signing_string(method: &str, path_and_query: &str, date: &str) -> String {
        format!(
            "(request-target): {} {}\naccept: {}\ndate: {}",
            method.to_ascii_lowercase(),
            path_and_query,
            ACCEPT,
            date
        )
    }

    /// `Authorization` header value for one request
    pub fn authorization(
        &self,
        method: &str,
        path_and_query: &str,
        date: &str,
    ) -> StoreResult<String> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| StoreError::InvalidRequest(format!("Invalid signing secret: {e}")))?;
        mac.update(Self::signing_string(method, path_and_query, date).as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        Ok(format!(
            "Signature keyId=\"{}\",algorithm=\"hmac-sha256\",headers=\"{}\",signature=\"{}\"",
            self.key_id, SIGNED_HEADERS, signature
        ))
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("key_id", &self.key_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const DATE: &str = "Tue, 04 Mar 2025 05:06:07 GMT";

    #[test]
    fn test_http_date_format() {
        let at = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(http_date(at), DATE);
    }

    #[test]
    fn test_signing_string_layout() {
        let s = RequestSigner::signing_string("GET", "/api/v1/users/users/?username=alice", DATE);
        assert_eq!(
            s,
            "(request-target): get /api/v1/users/users/?username=alice\n\
             accept: application/json\n\
             date: Tue, 04 Mar 2025 05:06:07 GMT"
        );
    }

    #[test]
    fn test_authorization_header_shape() {
        let signer = RequestSigner::new("key-1", "secret");
        let header = signer.authorization("GET", "/api/v1/assets/nodes/", DATE).unwrap();
        assert!(header.starts_with("Signature keyId=\"key-1\",algorithm=\"hmac-sha256\""));
        assert!(header.contains("headers=\"(request-target) accept date\""));
        // 32-byte HMAC → 44 base64 characters
        let signature = header.rsplit("signature=\"").next().unwrap().trim_end_matches('"');
        assert_eq!(signature.len(), 44);
    }

    #[test]
    fn test_signature_depends_on_target_and_secret() {
        let signer = RequestSigner::new("key-1", "secret");
        let sign = |signer: &RequestSigner, method: &str| {
            signer.authorization(method, "/api/v1/assets/nodes/", DATE).unwrap()
        };
        let a = sign(&signer, "GET");
        assert_eq!(a, sign(&signer, "GET"));
        assert_ne!(a, sign(&signer, "DELETE"));
        assert_ne!(a, sign(&RequestSigner::new("key-1", "other"), "GET"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", RequestSigner::new("key-1", "hunter2"));
        assert!(!debug.contains("hunter2"));
    }
}
