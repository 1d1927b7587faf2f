//! GitHub webhook signature (`X-Hub-Signature-256`) verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";
const PREFIX: &str = "sha256=";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing X-Hub-Signature-256 header")]
    Missing,

    #[error("signature must look like 'sha256=<hex>'")]
    Malformed,

    #[error("signature does not match payload")]
    Mismatch,
}

/// Checks `header` against HMAC-SHA256(`secret`, `body`) in constant time.
pub fn verify(secret: &str, body: &[u8], header: Option<&str>) -> Result<(), SignatureError> {
    let header = header.ok_or(SignatureError::Missing)?;
    let hex_sig = header.trim().strip_prefix(PREFIX).ok_or(SignatureError::Malformed)?;
    let expected = hex::decode(hex_sig).map_err(|_| SignatureError::Malformed)?;

    // HMAC accepts keys of any length.
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Mismatch)?;
    mac.update(body);
    mac.verify_slice(&expected).map_err(|_| SignatureError::Mismatch)
}

/// `sha256=<hex>` for `body`, as GitHub would send it.
pub fn sign(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(format!("{PREFIX}{}", hex::encode(mac.finalize().into_bytes())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_matching_signature() {
        let body = br#"{"zen":"Keep it logically awesome."}"#;
        let header = sign("s3cret", body).unwrap();
        assert!(header.starts_with("sha256="));
        assert_eq!(verify("s3cret", body, Some(&header)), Ok(()));
    }

    #[test]
    fn rejects_other_secret_or_body() {
        let header = sign("s3cret", b"payload").unwrap();
        assert_eq!(verify("other", b"payload", Some(&header)), Err(SignatureError::Mismatch));
        assert_eq!(verify("s3cret", b"payload!", Some(&header)), Err(SignatureError::Mismatch));
    }

    #[test]
    fn rejects_missing_or_malformed_header() {
        assert_eq!(verify("s", b"x", None), Err(SignatureError::Missing));
        assert_eq!(verify("s", b"x", Some("sha1=abcd")), Err(SignatureError::Malformed));
        assert_eq!(verify("s", b"x", Some("sha256=zz")), Err(SignatureError::Malformed));
    }
}
