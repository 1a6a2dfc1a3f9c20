//! The JSON envelope and plain-text rendering shared by every delivery
//! channel. One notification is built once per firing and handed to the
//! notifier, which fans it out to webhook and chat channels alike.

use chrono::{DateTime, Utc};
use lunasentri_domain_models::{AlertEvent, AlertRule, Comparator};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct RulePayload {
    pub id: i64,
    pub name: String,
    pub metric: String,
    pub comparison: Comparator,
    pub threshold_pct: f64,
    pub trigger_after: u32,
}

impl From<&AlertRule> for RulePayload {
    fn from(rule: &AlertRule) -> Self {
        Self {
            id: rule.id,
            name: rule.name.clone(),
            metric: rule.metric.clone(),
            comparison: rule.comparison,
            threshold_pct: rule.threshold_pct,
            trigger_after: rule.trigger_after,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventPayload {
    pub id: i64,
    pub triggered_at: DateTime<Utc>,
    pub value: f64,
    pub acknowledged: bool,
}

impl From<&AlertEvent> for EventPayload {
    fn from(event: &AlertEvent) -> Self {
        Self {
            id: event.id,
            triggered_at: event.triggered_at,
            value: event.value,
            acknowledged: event.acknowledged,
        }
    }
}

/// The wire body every delivery channel receives. Has no version field by
/// design — receivers must tolerate unknown fields, since schema
/// evolution is explicitly unaddressed.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    pub rule: RulePayload,
    pub event: EventPayload,
    pub ts: i64,
}

impl WebhookPayload {
    pub fn new(rule: &AlertRule, event: &AlertEvent) -> Self {
        Self {
            rule: rule.into(),
            event: event.into(),
            ts: Utc::now().timestamp(),
        }
    }

    pub fn to_json_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("webhook payload always serializes")
    }
}

/// Plain-text rendering of a firing, used by chat-bot delivery.
pub fn render_chat_text(rule: &AlertRule, event: &AlertEvent) -> String {
    let comparison = match rule.comparison {
        Comparator::Above => "above",
        Comparator::Below => "below",
    };
    format!(
        "LunaSentri alert: \"{}\" - {} is {} {} (value {:.2}) at {}",
        rule.name, rule.metric, comparison, rule.threshold_pct, event.value, event.triggered_at
    )
}
