use lunasentri_core_identity::{generate_reset_token, hash_reset_token};

/// A machine API key is mechanically the same shape as a password-reset
/// token: a random 32-byte lookup secret whose digest, not the raw value,
/// is what gets stored. Reuses the identity crate's token primitives
/// rather than duplicating them under a different name.
pub fn generate_api_key() -> String {
    generate_reset_token()
}

pub fn hash_api_key(raw: &str) -> String {
    hash_reset_token(raw)
}
