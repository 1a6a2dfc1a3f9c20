use rand::RngCore;
use sha2::{Digest, Sha256};

/// Generates a random 32-byte reset token, hex-encoded for transport. The
/// caller decides whether to persist its digest — generation itself never
/// touches the store, so an enumeration-defending caller can produce one
/// for a nonexistent email without a branch in this function.
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Deterministic digest of a reset token, used as the stored lookup key.
pub fn hash_reset_token(raw_token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashing_is_deterministic() {
        let token = generate_reset_token();
        assert_eq!(hash_reset_token(&token), hash_reset_token(&token));
    }

    #[test]
    fn distinct_tokens_are_vanishingly_unlikely_to_collide() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_ne!(a, b);
    }
}
