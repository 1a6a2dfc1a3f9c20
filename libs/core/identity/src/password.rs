use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::error::IdentityError;

/// Hashes a password into an Argon2id PHC string. The distilled spec
/// excludes password hashing itself from the core — only the
/// verification contract (`verify_password`) is exercised by the rest
/// of the engine; this wraps a single, unconfigurable default.
pub fn hash_password(password: &str) -> Result<String, IdentityError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| IdentityError::HashingFailed)
}

/// Constant-time verification by construction of `PasswordHash` comparison.
/// A malformed verifier is treated as a non-match rather than propagated,
/// since it can only arise from corrupted storage, not caller input.
pub fn verify_password(password: &str, verifier: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(verifier) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_a_freshly_hashed_password() {
        let verifier = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &verifier));
        assert!(!verify_password("wrong password", &verifier));
    }

    #[test]
    fn rejects_a_malformed_verifier_without_panicking() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
