use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use lunasentri_domain_models::{AlertEvent, AlertRule, DeliveryChannel};
use lunasentri_domain_notification::{render_chat_text, WebhookPayload};
use lunasentri_infra_store::ChannelRepository;
use tracing::{error, info, instrument, warn};

use crate::client::DeliveryClient;

const FANOUT_DEADLINE: Duration = Duration::from_secs(10);

/// Dispatches one firing to every enabled channel, detached from the
/// caller's own cancellation scope. Rules are global, so a firing reaches
/// every operator's enabled channels, not just one operator's subset.
pub struct Notifier {
    channels: Arc<ChannelRepository>,
    delivery: Arc<DeliveryClient>,
}

impl Notifier {
    pub fn new(channels: ChannelRepository, delivery: DeliveryClient) -> Self {
        Self {
            channels: Arc::new(channels),
            delivery: Arc::new(delivery),
        }
    }

    /// Returns immediately; the actual fan-out runs on a spawned task with
    /// its own deadline, independent of the caller's request lifetime.
    pub fn notify(&self, rule: AlertRule, event: AlertEvent) {
        let channels = self.channels.clone();
        let delivery = self.delivery.clone();

        tokio::spawn(async move {
            let outcome = tokio::time::timeout(FANOUT_DEADLINE, run_fanout(channels, delivery, rule, event)).await;
            if outcome.is_err() {
                error!("notification fan-out exceeded its deadline");
            }
        });
    }
}

#[instrument(skip(channels, delivery, rule, event), fields(rule_id = rule.id, event_id = event.id))]
async fn run_fanout(
    channels: Arc<ChannelRepository>,
    delivery: Arc<DeliveryClient>,
    rule: AlertRule,
    event: AlertEvent,
) {
    let enabled = match channels.list_all_enabled().await {
        Ok(list) => list,
        Err(e) => {
            error!(error = %e, "could not list delivery channels for fan-out");
            return;
        }
    };

    if enabled.is_empty() {
        return;
    }

    let payload = WebhookPayload::new(&rule, &event);
    let text = render_chat_text(&rule, &event);

    let deliveries = enabled.into_iter().map(|channel| {
        let delivery = delivery.clone();
        let channels = channels.clone();
        let payload = payload.clone();
        let text = text.clone();
        async move { deliver_one(channels, delivery, channel, payload, text).await }
    });

    join_all(deliveries).await;
    info!("fan-out complete");
}

async fn deliver_one(
    channels: Arc<ChannelRepository>,
    delivery: Arc<DeliveryClient>,
    mut channel: DeliveryChannel,
    payload: WebhookPayload,
    text: String,
) {
    let now = Utc::now();
    if channel.state().is_suppressed(now) {
        return;
    }

    match delivery.deliver(&channel, &payload, &text).await {
        Ok(()) => channel.state_mut().record_success(now),
        Err(e) => {
            warn!(error = %e, "channel delivery failed");
            channel.state_mut().record_failure(now);
        }
    }

    if let Err(e) = channels.save_state(&channel).await {
        error!(error = %e, "could not persist channel state after delivery attempt");
    }
}
