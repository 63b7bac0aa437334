use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 of `body` keyed with `secret`.
pub fn sign(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}

pub fn verify_signature(secret: &str, body: &[u8], provided: &str) -> bool {
    let Some(expected) = sign(secret, body) else {
        return false;
    };
    let provided = provided.trim().to_ascii_lowercase();
    ConstantTimeEq::ct_eq(provided.as_bytes(), expected.as_bytes()).into()
}
