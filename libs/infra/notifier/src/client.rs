use std::time::Duration;

use lunasentri_domain_models::DeliveryChannel;
use lunasentri_domain_notification::WebhookPayload;
use reqwest::{redirect::Policy, Client, StatusCode};
use serde::Serialize;
use tracing::{instrument, warn};

use crate::errors::NotifyError;
use crate::signature::sign_body;

const PER_CHANNEL_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct TelegramSendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Thin HTTP adapter over both delivery transports. Holds no channel state
/// of its own — callers persist the post-attempt `ChannelState` themselves.
pub struct DeliveryClient {
    http: Client,
    telegram_bot_token: Option<String>,
}

impl DeliveryClient {
    pub fn new(telegram_bot_token: Option<String>) -> Self {
        let http = Client::builder()
            .redirect(Policy::none())
            .timeout(PER_CHANNEL_TIMEOUT)
            .build()
            .expect("reqwest client builds with static TLS config");
        Self { http, telegram_bot_token }
    }

    #[instrument(skip(self, payload, text))]
    pub async fn deliver(
        &self,
        channel: &DeliveryChannel,
        payload: &WebhookPayload,
        text: &str,
    ) -> Result<(), NotifyError> {
        match channel {
            DeliveryChannel::Webhook(webhook) => {
                let body = payload.to_json_bytes();
                let signature = sign_body(&webhook.secret_hash, &body);

                let response = self
                    .http
                    .post(&webhook.url)
                    .header("X-LunaSentri-Signature", signature)
                    .header("Content-Type", "application/json")
                    .body(body)
                    .send()
                    .await?;

                if response.status().is_success() {
                    Ok(())
                } else {
                    Err(NotifyError::Rejected(response.status()))
                }
            }
            DeliveryChannel::Chat(chat) => {
                let token = self.telegram_bot_token.as_deref().ok_or_else(|| {
                    warn!("chat channel configured without a bot token");
                    NotifyError::Rejected(StatusCode::PRECONDITION_FAILED)
                })?;

                let url = format!("https://api.telegram.org/bot{token}/sendMessage");
                let response = self
                    .http
                    .post(&url)
                    .json(&TelegramSendMessage { chat_id: &chat.chat_id, text })
                    .send()
                    .await?;

                if response.status().is_success() {
                    Ok(())
                } else {
                    Err(NotifyError::Rejected(response.status()))
                }
            }
        }
    }
}
