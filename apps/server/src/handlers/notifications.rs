use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use lunasentri_core_identity::generate_reset_token;
use lunasentri_domain_models::{AlertEvent, AlertRule, ChatChannel, Comparator, DeliveryChannel, WebhookChannel};
use lunasentri_domain_notification::{render_chat_text, WebhookPayload};
use lunasentri_infra_notifier::DeliveryClient;

use crate::error::ApiError;
use crate::middleware::OperatorIdentity;
use crate::state::AppState;

fn require_channel_owner(owner_id: i64, identity: &OperatorIdentity) -> Result<(), ApiError> {
    if owner_id != identity.operator_id {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

/// A placeholder firing used only to exercise a channel's transport; never
/// persisted, hence rule/event id `0`.
fn synthetic_test_firing() -> (AlertRule, AlertEvent) {
    let now = Utc::now();
    let rule = AlertRule {
        id: 0,
        name: "test notification".to_string(),
        metric: "cpu_pct".to_string(),
        comparison: Comparator::Above,
        threshold_pct: 0.0,
        trigger_after: 1,
        created_at: now,
        updated_at: now,
    };
    let event = AlertEvent {
        id: 0,
        rule_id: 0,
        triggered_at: now,
        value: 0.0,
        acknowledged: false,
        acknowledged_at: None,
    };
    (rule, event)
}

// --- webhooks ---

#[derive(Debug, Deserialize)]
pub struct CreateWebhookRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct CreateWebhookResponse {
    #[serde(flatten)]
    pub channel: WebhookChannel,
    /// The signing secret, shown exactly once at creation — it is stored
    /// verbatim, not as a digest (see the notifier's signature module),
    /// so it cannot be redisplayed later.
    pub secret: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateWebhookRequest {
    pub url: Option<String>,
    pub enabled: Option<bool>,
}

pub async fn list_webhooks(
    Extension(identity): Extension<OperatorIdentity>,
    State(state): State<AppState>,
) -> Result<Json<Vec<WebhookChannel>>, ApiError> {
    Ok(Json(state.channels.list_webhooks_for_owner(identity.operator_id).await?))
}

pub async fn create_webhook(
    Extension(identity): Extension<OperatorIdentity>,
    State(state): State<AppState>,
    Json(body): Json<CreateWebhookRequest>,
) -> Result<(StatusCode, Json<CreateWebhookResponse>), ApiError> {
    let secret = generate_reset_token();
    let channel = state.channels.create_webhook(identity.operator_id, &body.url, &secret).await?;
    Ok((StatusCode::CREATED, Json(CreateWebhookResponse { channel, secret })))
}

pub async fn update_webhook(
    Extension(identity): Extension<OperatorIdentity>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateWebhookRequest>,
) -> Result<Json<WebhookChannel>, ApiError> {
    let channel = state.channels.find_webhook(id).await?.ok_or(ApiError::NotFound)?;
    require_channel_owner(channel.owner_id, &identity)?;

    state.channels.update_webhook(id, body.url.as_deref(), body.enabled).await?;
    let updated = state.channels.find_webhook(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(updated))
}

pub async fn delete_webhook(
    Extension(identity): Extension<OperatorIdentity>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let channel = state.channels.find_webhook(id).await?.ok_or(ApiError::NotFound)?;
    require_channel_owner(channel.owner_id, &identity)?;
    state.channels.delete_webhook(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn test_webhook(
    Extension(identity): Extension<OperatorIdentity>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let channel = state.channels.find_webhook(id).await?.ok_or(ApiError::NotFound)?;
    require_channel_owner(channel.owner_id, &identity)?;

    let (rule, event) = synthetic_test_firing();
    let payload = WebhookPayload::new(&rule, &event);
    let text = render_chat_text(&rule, &event);
    let delivery = DeliveryClient::new(state.config.telegram_bot_token.clone());

    delivery
        .deliver(&DeliveryChannel::Webhook(channel), &payload, &text)
        .await
        .map_err(|_| ApiError::Validation("test delivery failed".into()))?;
    Ok(StatusCode::NO_CONTENT)
}

// --- telegram (chat) ---

#[derive(Debug, Deserialize)]
pub struct CreateTelegramRequest {
    pub chat_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTelegramRequest {
    pub chat_id: Option<String>,
    pub enabled: Option<bool>,
}

pub async fn list_telegram(
    Extension(identity): Extension<OperatorIdentity>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ChatChannel>>, ApiError> {
    Ok(Json(state.channels.list_chat_for_owner(identity.operator_id).await?))
}

pub async fn create_telegram(
    Extension(identity): Extension<OperatorIdentity>,
    State(state): State<AppState>,
    Json(body): Json<CreateTelegramRequest>,
) -> Result<(StatusCode, Json<ChatChannel>), ApiError> {
    let channel = state.channels.create_chat(identity.operator_id, &body.chat_id).await?;
    Ok((StatusCode::CREATED, Json(channel)))
}

pub async fn update_telegram(
    Extension(identity): Extension<OperatorIdentity>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateTelegramRequest>,
) -> Result<Json<ChatChannel>, ApiError> {
    let channel = state.channels.find_chat(id).await?.ok_or(ApiError::NotFound)?;
    require_channel_owner(channel.owner_id, &identity)?;

    state.channels.update_chat(id, body.chat_id.as_deref(), body.enabled).await?;
    let updated = state.channels.find_chat(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(updated))
}

pub async fn delete_telegram(
    Extension(identity): Extension<OperatorIdentity>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let channel = state.channels.find_chat(id).await?.ok_or(ApiError::NotFound)?;
    require_channel_owner(channel.owner_id, &identity)?;
    state.channels.delete_chat(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn test_telegram(
    Extension(identity): Extension<OperatorIdentity>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let channel = state.channels.find_chat(id).await?.ok_or(ApiError::NotFound)?;
    require_channel_owner(channel.owner_id, &identity)?;

    let (rule, event) = synthetic_test_firing();
    let payload = WebhookPayload::new(&rule, &event);
    let text = render_chat_text(&rule, &event);
    let delivery = DeliveryClient::new(state.config.telegram_bot_token.clone());

    delivery
        .deliver(&DeliveryChannel::Chat(channel), &payload, &text)
        .await
        .map_err(|_| ApiError::Validation("test delivery failed".into()))?;
    Ok(StatusCode::NO_CONTENT)
}
