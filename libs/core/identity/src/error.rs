use thiserror::Error;

/// Mirrors spec's collapsed `INVALID_CREDENTIALS` policy: nonexistent
/// email and wrong password are indistinguishable to every caller.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid or malformed session token")]
    InvalidSession,
    #[error("session expired")]
    SessionExpired,
    #[error("invalid or already-used reset token")]
    InvalidResetToken,
    #[error("password hashing failed")]
    HashingFailed,
}
