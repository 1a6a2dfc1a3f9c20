//! Dual-citizenship authentication: operators carry a signed session
//! cookie, agents carry a raw API key. Each guard injects its resolved
//! identity as a request extension for downstream handlers.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::apikey::hash_api_key;
use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_COOKIE_NAME: &str = "lunasentri_session";

/// The resolved operator for a request, injected by [`require_operator`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OperatorIdentity {
    pub operator_id: i64,
    pub is_admin: bool,
}

/// Resolves the session cookie and re-reads the operator record, so a
/// token outliving its operator (deleted account) is rejected even
/// though the signature itself still verifies.
pub async fn require_operator(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar
        .get(SESSION_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .ok_or(ApiError::Authentication)?;

    let session = state
        .sessions
        .resolve_session(&token)
        .map_err(|_| ApiError::Authentication)?;

    let operator = state
        .operators
        .find_by_id(session.operator_id)
        .await
        .map_err(|_| ApiError::Authentication)?
        .ok_or(ApiError::Authentication)?;

    req.extensions_mut().insert(OperatorIdentity {
        operator_id: operator.id,
        is_admin: operator.is_admin,
    });

    Ok(next.run(req).await)
}

/// Authenticates an agent via `X-API-Key` or `Authorization: Bearer`,
/// rejecting a disabled machine or one whose owner no longer exists.
pub async fn require_machine(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let raw_key = req
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| {
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::to_string)
        })
        .ok_or(ApiError::Authentication)?;

    let machine = state
        .machines
        .find_by_api_key_hash(&hash_api_key(&raw_key))
        .await
        .map_err(|_| ApiError::Authentication)?
        .ok_or(ApiError::Authentication)?;

    if !machine.enabled {
        return Err(ApiError::Authentication);
    }

    let owner_exists = state
        .operators
        .find_by_id(machine.owner_operator_id)
        .await
        .map_err(|_| ApiError::Authentication)?
        .is_some();
    if !owner_exists {
        return Err(ApiError::Authentication);
    }

    req.extensions_mut().insert(machine);

    Ok(next.run(req).await)
}
