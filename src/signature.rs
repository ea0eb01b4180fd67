//! Webhook signature verification.
//!
//! The messaging platform signs every webhook delivery with HMAC-SHA256 over
//! the raw request body, base64 encoded in the `X-Line-Signature` header.
//! Verification runs on the raw bytes before any JSON parsing and fails
//! closed on a missing or malformed header.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub fn verify_signature(channel_secret: &str, signature: &str, raw_body: &[u8]) -> bool {
    if signature.is_empty() || channel_secret.is_empty() {
        return false;
    }
    let Ok(mut mac) = HmacSha256::new_from_slice(channel_secret.as_bytes()) else {
        return false;
    };
    mac.update(raw_body);
    let expected = BASE64_STANDARD.encode(mac.finalize().into_bytes());
    ConstantTimeEq::ct_eq(expected.as_bytes(), signature.as_bytes()).unwrap_u8() == 1
}
