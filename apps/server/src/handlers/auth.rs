use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use lunasentri_core_identity::{generate_reset_token, hash_password, hash_reset_token, verify_password};
use lunasentri_domain_models::OperatorProfile;

use crate::config::Config;
use crate::error::ApiError;
use crate::middleware::{OperatorIdentity, SESSION_COOKIE_NAME};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// A syntactically valid Argon2id hash nobody's password will ever match,
/// computed once so a lookup miss spends roughly the same wall time as a
/// wrong-password hit instead of short-circuiting on the email query.
static DUMMY_VERIFIER: Lazy<String> =
    Lazy::new(|| hash_password("lunasentri-timing-guard").expect("dummy hash computes"));

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ForgotPasswordResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

fn session_cookie(config: &Config, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies)
        .path("/")
        .max_age(time::Duration::minutes(config.access_ttl_minutes))
        .build()
}

fn expired_session_cookie(config: &Config) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies)
        .path("/")
        .max_age(time::Duration::seconds(-1))
        .build()
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<OperatorProfile>), ApiError> {
    validate_password(&body.password)?;
    let verifier = hash_password(&body.password)?;
    let operator = state.operators.register(&body.email, &verifier).await?;
    Ok((StatusCode::CREATED, Json(operator.into())))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<OperatorProfile>), ApiError> {
    let operator = match state.operators.find_by_email(&body.email).await? {
        Some(operator) if verify_password(&body.password, &operator.password_verifier) => operator,
        Some(_) => return Err(ApiError::Authentication),
        None => {
            let _ = verify_password(&body.password, &DUMMY_VERIFIER);
            return Err(ApiError::Authentication);
        }
    };

    let token = state.sessions.issue_session(operator.id, state.config.access_ttl());
    let cookie = session_cookie(&state.config, token);
    Ok((jar.add(cookie), Json(operator.into())))
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, StatusCode) {
    (jar.add(expired_session_cookie(&state.config)), StatusCode::NO_CONTENT)
}

pub async fn me(
    Extension(identity): Extension<OperatorIdentity>,
    State(state): State<AppState>,
) -> Result<Json<OperatorProfile>, ApiError> {
    let operator = state
        .operators
        .find_by_id(identity.operator_id)
        .await?
        .ok_or(ApiError::Authentication)?;
    Ok(Json(operator.into()))
}

pub async fn change_password(
    Extension(identity): Extension<OperatorIdentity>,
    State(state): State<AppState>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    validate_password(&body.new_password)?;
    let operator = state
        .operators
        .find_by_id(identity.operator_id)
        .await?
        .ok_or(ApiError::Authentication)?;

    if !verify_password(&body.current_password, &operator.password_verifier) {
        return Err(ApiError::Authentication);
    }

    let verifier = hash_password(&body.new_password)?;
    state.operators.update_password_verifier(operator.id, &verifier).await?;
    state.operators.invalidate_reset_tokens(operator.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Always 202, even for an unknown email — the digest is only stored when
/// an operator actually owns it, so no enumeration signal escapes.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<(StatusCode, Json<ForgotPasswordResponse>), ApiError> {
    let raw_token = generate_reset_token();

    if let Some(operator) = state.operators.find_by_email(&body.email).await? {
        let digest = hash_reset_token(&raw_token);
        let expires_at = Utc::now() + state.config.reset_ttl();
        state.operators.store_reset_token(operator.id, &digest, expires_at).await?;
    }

    let reset_token = state.config.dev_expose_reset_token.then_some(raw_token);
    Ok((StatusCode::ACCEPTED, Json(ForgotPasswordResponse { reset_token })))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    validate_password(&body.password)?;
    let digest = hash_reset_token(&body.token);
    let operator_id = state
        .operators
        .consume_reset_token(&digest)
        .await?
        .ok_or_else(|| ApiError::Validation("invalid or expired reset token".into()))?;

    let verifier = hash_password(&body.password)?;
    state.operators.update_password_verifier(operator_id, &verifier).await?;
    state.operators.invalidate_reset_tokens(operator_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_users(
    Extension(identity): Extension<OperatorIdentity>,
    State(state): State<AppState>,
) -> Result<Json<Vec<OperatorProfile>>, ApiError> {
    if !identity.is_admin {
        return Err(ApiError::Forbidden);
    }
    let operators = state.operators.list().await?;
    Ok(Json(operators.into_iter().map(Into::into).collect()))
}

pub async fn create_user(
    Extension(identity): Extension<OperatorIdentity>,
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<OperatorProfile>), ApiError> {
    if !identity.is_admin {
        return Err(ApiError::Forbidden);
    }
    validate_password(&body.password)?;
    let verifier = hash_password(&body.password)?;
    let operator = state.operators.register(&body.email, &verifier).await?;
    Ok((StatusCode::CREATED, Json(operator.into())))
}

/// The last admin and self-deletion are both blocked — the latter here,
/// the former inside `OperatorRepository::delete`.
pub async fn delete_user(
    Extension(identity): Extension<OperatorIdentity>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !identity.is_admin {
        return Err(ApiError::Forbidden);
    }
    if identity.operator_id == id {
        return Err(ApiError::Forbidden);
    }
    state.operators.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
