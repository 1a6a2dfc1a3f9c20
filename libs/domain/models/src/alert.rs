use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    Above,
    Below,
}

/// A predicate over one metric plus a `trigger_after` arming count. Rules
/// are global across machines in this design — the engine evaluates every
/// rule against every sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: i64,
    pub name: String,
    pub metric: String,
    pub comparison: Comparator,
    pub threshold_pct: f64,
    pub trigger_after: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single firing of a rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: i64,
    pub rule_id: i64,
    pub triggered_at: DateTime<Utc>,
    pub value: f64,
    pub acknowledged: bool,
    pub acknowledged_at: Option<DateTime<Utc>>,
}
