use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use lunasentri_domain_alerts::validate_rule_fields;
use lunasentri_domain_models::{AlertEvent, AlertRule, Comparator};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RuleRequest {
    pub name: String,
    pub metric: String,
    pub comparison: String,
    pub threshold_pct: f64,
    pub trigger_after: u32,
}

fn parse_comparison(raw: &str) -> Comparator {
    match raw {
        "below" => Comparator::Below,
        _ => Comparator::Above,
    }
}

pub async fn list_rules(State(state): State<AppState>) -> Result<Json<Vec<AlertRule>>, ApiError> {
    Ok(Json(state.alert_rules.list().await?))
}

pub async fn create_rule(
    State(state): State<AppState>,
    Json(body): Json<RuleRequest>,
) -> Result<(StatusCode, Json<AlertRule>), ApiError> {
    validate_rule_fields(&body.name, &body.metric, &body.comparison, body.threshold_pct, body.trigger_after)?;

    let rule = state
        .alert_rules
        .create(&body.name, &body.metric, parse_comparison(&body.comparison), body.threshold_pct, body.trigger_after)
        .await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

/// Updating a rule clears its arming counter — the old consecutive-breach
/// progress no longer describes the rule now in effect.
pub async fn update_rule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<RuleRequest>,
) -> Result<Json<AlertRule>, ApiError> {
    validate_rule_fields(&body.name, &body.metric, &body.comparison, body.threshold_pct, body.trigger_after)?;

    state
        .alert_rules
        .update(id, &body.name, &body.metric, parse_comparison(&body.comparison), body.threshold_pct, body.trigger_after)
        .await?;
    state.alert_engine.clear_counter(id);

    let rule = state.alert_rules.find_by_id(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(rule))
}

pub async fn delete_rule(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode, ApiError> {
    state.alert_rules.delete(id).await?;
    state.alert_engine.clear_counter(id);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    pub limit: Option<i64>,
}

const DEFAULT_EVENT_LIMIT: i64 = 50;

pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<Vec<AlertEvent>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_EVENT_LIMIT);
    Ok(Json(state.alert_events.list(limit).await?))
}

pub async fn acknowledge_event(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode, ApiError> {
    state.alert_events.acknowledge(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
