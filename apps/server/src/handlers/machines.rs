use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use lunasentri_domain_models::Machine;

use crate::apikey::{generate_api_key, hash_api_key};
use crate::error::ApiError;
use crate::middleware::OperatorIdentity;
use crate::state::AppState;

fn require_owner(machine: &Machine, identity: &OperatorIdentity) -> Result<(), ApiError> {
    if machine.owner_operator_id != identity.operator_id {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct RegisterMachineRequest {
    pub name: String,
    pub hostname: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterMachineResponse {
    #[serde(flatten)]
    pub machine: Machine,
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMachineRequest {
    pub name: Option<String>,
    pub hostname: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RotateKeyResponse {
    pub api_key: String,
}

/// `api_key` is returned raw exactly once, here.
pub async fn register_machine(
    Extension(identity): Extension<OperatorIdentity>,
    State(state): State<AppState>,
    Json(body): Json<RegisterMachineRequest>,
) -> Result<(StatusCode, Json<RegisterMachineResponse>), ApiError> {
    let raw_key = generate_api_key();
    let key_hash = hash_api_key(&raw_key);

    let machine = state
        .machines
        .register(
            identity.operator_id,
            &body.name,
            body.hostname.as_deref(),
            body.description.as_deref(),
            &key_hash,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterMachineResponse { machine, api_key: raw_key }),
    ))
}

pub async fn list_machines(
    Extension(identity): Extension<OperatorIdentity>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Machine>>, ApiError> {
    let machines = state.machines.list_for_owner(identity.operator_id).await?;
    Ok(Json(machines))
}

pub async fn get_machine(
    Extension(identity): Extension<OperatorIdentity>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Machine>, ApiError> {
    let machine = state.machines.find_by_id(id).await?.ok_or(ApiError::NotFound)?;
    require_owner(&machine, &identity)?;
    Ok(Json(machine))
}

pub async fn update_machine(
    Extension(identity): Extension<OperatorIdentity>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateMachineRequest>,
) -> Result<Json<Machine>, ApiError> {
    let machine = state.machines.find_by_id(id).await?.ok_or(ApiError::NotFound)?;
    require_owner(&machine, &identity)?;

    state
        .machines
        .update(id, body.name.as_deref(), body.hostname.as_deref(), body.description.as_deref())
        .await?;

    let updated = state.machines.find_by_id(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(updated))
}

pub async fn delete_machine(
    Extension(identity): Extension<OperatorIdentity>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let machine = state.machines.find_by_id(id).await?.ok_or(ApiError::NotFound)?;
    require_owner(&machine, &identity)?;
    state.machines.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn enable_machine(
    Extension(identity): Extension<OperatorIdentity>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let machine = state.machines.find_by_id(id).await?.ok_or(ApiError::NotFound)?;
    require_owner(&machine, &identity)?;
    state.machines.set_enabled(id, true).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn disable_machine(
    Extension(identity): Extension<OperatorIdentity>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let machine = state.machines.find_by_id(id).await?.ok_or(ApiError::NotFound)?;
    require_owner(&machine, &identity)?;
    state.machines.set_enabled(id, false).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn rotate_key(
    Extension(identity): Extension<OperatorIdentity>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RotateKeyResponse>, ApiError> {
    let machine = state.machines.find_by_id(id).await?.ok_or(ApiError::NotFound)?;
    require_owner(&machine, &identity)?;

    let raw_key = generate_api_key();
    state.machines.rotate_key(id, &hash_api_key(&raw_key)).await?;
    Ok(Json(RotateKeyResponse { api_key: raw_key }))
}
