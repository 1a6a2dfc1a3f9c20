use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Failure/cool-down bookkeeping shared by every delivery channel variant,
/// regardless of transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelState {
    pub enabled: bool,
    pub failure_count: u32,
    pub last_success: Option<DateTime<Utc>>,
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_error_at: Option<DateTime<Utc>>,
    pub cooldown_until: Option<DateTime<Utc>>,
}

impl ChannelState {
    pub fn new() -> Self {
        Self {
            enabled: true,
            failure_count: 0,
            last_success: None,
            last_attempt: None,
            last_error_at: None,
            cooldown_until: None,
        }
    }

    /// Failure count at which the cool-down engages.
    pub const COOLDOWN_THRESHOLD: u32 = 5;

    pub fn is_suppressed(&self, now: DateTime<Utc>) -> bool {
        if !self.enabled {
            return true;
        }
        matches!(self.cooldown_until, Some(until) if until > now)
    }

    pub fn record_success(&mut self, now: DateTime<Utc>) {
        self.last_success = Some(now);
        self.last_attempt = Some(now);
        self.failure_count = 0;
        self.cooldown_until = None;
    }

    /// Exponential backoff in seconds, capped at one hour, starting once
    /// `failure_count` reaches `COOLDOWN_THRESHOLD`.
    pub fn record_failure(&mut self, now: DateTime<Utc>) {
        self.failure_count += 1;
        self.last_attempt = Some(now);
        self.last_error_at = Some(now);
        if self.failure_count >= Self::COOLDOWN_THRESHOLD {
            let exp = self.failure_count - Self::COOLDOWN_THRESHOLD;
            let backoff_secs = (5u64.saturating_mul(1u64 << exp.min(16))).min(3600);
            self.cooldown_until = Some(now + chrono::Duration::seconds(backoff_secs as i64));
        }
    }
}

impl Default for ChannelState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookChannel {
    pub id: i64,
    pub owner_id: i64,
    pub url: String,
    #[serde(skip_serializing)]
    pub secret_hash: String,
    #[serde(flatten)]
    pub state: ChannelState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChannel {
    pub id: i64,
    pub owner_id: i64,
    pub chat_id: String,
    #[serde(flatten)]
    pub state: ChannelState,
}

/// The two delivery channel variants share one failure/cool-down state
/// machine; this enum, not an inheritance hierarchy, is the abstraction
/// point the notifier dispatches over.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeliveryChannel {
    Webhook(WebhookChannel),
    Chat(ChatChannel),
}

impl DeliveryChannel {
    pub fn owner_id(&self) -> i64 {
        match self {
            DeliveryChannel::Webhook(w) => w.owner_id,
            DeliveryChannel::Chat(c) => c.owner_id,
        }
    }

    pub fn state(&self) -> &ChannelState {
        match self {
            DeliveryChannel::Webhook(w) => &w.state,
            DeliveryChannel::Chat(c) => &c.state,
        }
    }

    pub fn state_mut(&mut self) -> &mut ChannelState {
        match self {
            DeliveryChannel::Webhook(w) => &mut w.state,
            DeliveryChannel::Chat(c) => &mut c.state,
        }
    }
}
