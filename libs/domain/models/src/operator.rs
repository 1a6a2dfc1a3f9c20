use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A human user of the control plane.
///
/// `password_verifier` is an opaque Argon2id PHC string; this crate never
/// inspects it, only carries it between the store and the identity crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operator {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_verifier: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Claims carried by a session token. The token itself is an opaque signed
/// string; this struct is the decoded payload `resolve_session` hands back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub operator_id: i64,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Public-facing operator profile, returned by `/auth/me` and friends —
/// never carries `password_verifier`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorProfile {
    pub id: i64,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Operator> for OperatorProfile {
    fn from(op: Operator) -> Self {
        Self {
            id: op.id,
            email: op.email,
            is_admin: op.is_admin,
            created_at: op.created_at,
        }
    }
}
