// src/utils/signature.rs

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Hex HMAC-SHA256 of `body` keyed by `secret`, the format payment webhooks are signed with.
pub fn sign_payload(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Checks a hex signature against the exact raw body.
///
/// The comparison is constant time. A signature that is not valid hex, or
/// has the wrong length, fails like any other mismatch.
pub fn verify_payload(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";

    #[test]
    fn test_known_vector() {
        // RFC 4231 test case 2
        let sig = sign_payload("Jefe", b"what do ya want for nothing?");
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_signed_body_verifies() {
        let body = br#"{"event":"payment.captured"}"#;
        let sig = sign_payload(SECRET, body);
        assert!(verify_payload(SECRET, body, &sig));
    }

    #[test]
    fn test_any_body_change_fails() {
        let body = br#"{"event":"payment.captured"}"#;
        let sig = sign_payload(SECRET, body);
        assert!(!verify_payload(SECRET, br#"{"event":"payment.captured" }"#, &sig));
        assert!(!verify_payload("other_secret", body, &sig));
    }

    #[test]
    fn test_malformed_signature_fails() {
        let body = b"{}";
        assert!(!verify_payload(SECRET, body, "not-hex"));
        assert!(!verify_payload(SECRET, body, ""));
        assert!(!verify_payload(SECRET, body, "abcd"));
    }
}
