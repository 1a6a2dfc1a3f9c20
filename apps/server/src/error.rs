use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use lunasentri_core_identity::IdentityError;
use lunasentri_domain_alerts::AlertError;
use lunasentri_infra_store::StoreError;

/// The HTTP edge's error taxonomy. Domain crates return their own typed
/// errors; handlers convert them here so no internal detail reaches a
/// response body.
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    /// `/metrics` and `/ws` without a `machine_id` when local-host metrics
    /// aren't enabled — distinct from `Validation` because the spec pins
    /// this specific case to 422 rather than 400.
    Unprocessable(String),
    Authentication,
    Forbidden,
    NotFound,
    Conflict(String),
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Unprocessable(message) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Authentication => StatusCode::UNAUTHORIZED.into_response(),
            ApiError::Forbidden => StatusCode::FORBIDDEN.into_response(),
            ApiError::NotFound => StatusCode::NOT_FOUND.into_response(),
            ApiError::Conflict(message) => {
                (StatusCode::CONFLICT, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredentials
            | IdentityError::InvalidSession
            | IdentityError::SessionExpired => ApiError::Authentication,
            IdentityError::InvalidResetToken => {
                ApiError::Validation("invalid or expired reset token".into())
            }
            IdentityError::HashingFailed => {
                error!(error = %err, "password hashing failed");
                ApiError::Internal
            }
        }
    }
}

impl From<AlertError> for ApiError {
    fn from(err: AlertError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

/// Last-admin protection is a conflict by taxonomy but a 403 by policy
/// (S6): deleting the sole remaining admin is forbidden, not merely
/// contended.
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::OperatorNotFound
            | StoreError::MachineNotFound
            | StoreError::RuleNotFound
            | StoreError::EventNotFound
            | StoreError::ChannelNotFound => ApiError::NotFound,
            StoreError::DuplicateEmail => ApiError::Conflict("email already registered".into()),
            StoreError::LastAdminProtected => ApiError::Forbidden,
            StoreError::Connection(_) | StoreError::Query(_) | StoreError::Mapping(_) => {
                error!(error = %err, "store error");
                ApiError::Internal
            }
        }
    }
}
