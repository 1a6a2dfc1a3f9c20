use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64_URL, Engine};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use lunasentri_domain_models::Session;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::IdentityError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Serialize, Deserialize)]
struct Header {
    alg: &'static str,
}

#[derive(Serialize, Deserialize)]
struct Claims {
    operator_id: i64,
    iat: i64,
    exp: i64,
}

/// Issues and resolves session tokens. Holds the process-wide signing
/// secret read once at startup and never mutated — per the concurrency
/// model, this is safe to share behind an `Arc` across request workers.
///
/// Token shape: `header.claims.signature`, each segment URL-safe base64
/// without padding, joined by `.`. The signature is HMAC-SHA256 over
/// `header.claims`. No external JWT crate is used; this is a closed,
/// single-issuer format.
pub struct SessionSigner {
    secret: Vec<u8>,
}

impl SessionSigner {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn issue_session(&self, operator_id: i64, ttl: Duration) -> String {
        let now = Utc::now();
        let claims = Claims {
            operator_id,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        self.encode(&claims)
    }

    fn encode(&self, claims: &Claims) -> String {
        let header = Header { alg: "HS256" };
        let header_b64 = BASE64_URL.encode(serde_json::to_vec(&header).expect("header serializes"));
        let claims_b64 = BASE64_URL.encode(serde_json::to_vec(claims).expect("claims serialize"));
        let signing_input = format!("{header_b64}.{claims_b64}");

        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(signing_input.as_bytes());
        let signature = BASE64_URL.encode(mac.finalize().into_bytes());

        format!("{signing_input}.{signature}")
    }

    /// Verifies the signature (constant-time) then checks expiry. Parsing
    /// failures and signature failures return the same `InvalidSession`
    /// variant — the caller cannot distinguish a malformed token from a
    /// forged one.
    pub fn resolve_session(&self, token: &str) -> Result<Session, IdentityError> {
        let parts: Vec<&str> = token.split('.').collect();
        let [header_b64, claims_b64, signature_b64] = parts[..] else {
            return Err(IdentityError::InvalidSession);
        };

        let signing_input = format!("{header_b64}.{claims_b64}");
        let signature =
            BASE64_URL.decode(signature_b64).map_err(|_| IdentityError::InvalidSession)?;

        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| IdentityError::InvalidSession)?;

        let claims_bytes =
            BASE64_URL.decode(claims_b64).map_err(|_| IdentityError::InvalidSession)?;
        let claims: Claims =
            serde_json::from_slice(&claims_bytes).map_err(|_| IdentityError::InvalidSession)?;

        let issued_at = DateTime::from_timestamp(claims.iat, 0).ok_or(IdentityError::InvalidSession)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(IdentityError::InvalidSession)?;

        if expires_at <= Utc::now() {
            return Err(IdentityError::SessionExpired);
        }

        Ok(Session {
            operator_id: claims.operator_id,
            issued_at,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_freshly_issued_token() {
        let signer = SessionSigner::new(b"test-secret".to_vec());
        let token = signer.issue_session(42, Duration::minutes(15));
        let session = signer.resolve_session(&token).expect("valid token resolves");
        assert_eq!(session.operator_id, 42);
    }

    #[test]
    fn rejects_a_token_signed_with_a_different_secret() {
        let signer_a = SessionSigner::new(b"secret-a".to_vec());
        let signer_b = SessionSigner::new(b"secret-b".to_vec());
        let token = signer_a.issue_session(1, Duration::minutes(15));
        assert!(matches!(
            signer_b.resolve_session(&token),
            Err(IdentityError::InvalidSession)
        ));
    }

    #[test]
    fn rejects_an_expired_token() {
        let signer = SessionSigner::new(b"test-secret".to_vec());
        let token = signer.issue_session(1, Duration::seconds(-1));
        assert!(matches!(
            signer.resolve_session(&token),
            Err(IdentityError::SessionExpired)
        ));
    }

    #[test]
    fn rejects_a_malformed_token() {
        let signer = SessionSigner::new(b"test-secret".to_vec());
        assert!(matches!(
            signer.resolve_session("not-a-token"),
            Err(IdentityError::InvalidSession)
        ));
    }
}
