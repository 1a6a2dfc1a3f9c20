use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One point-in-time measurement for a machine. Append-only; "latest
/// sample for machine M" is the read used by the alert engine and the
/// read/ack surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSample {
    pub machine_id: i64,
    pub recorded_at: DateTime<Utc>,
    pub cpu_pct: f64,
    pub mem_used_pct: f64,
    pub disk_used_pct: f64,
    pub net_rx_bytes: Option<u64>,
    pub net_tx_bytes: Option<u64>,
    pub uptime_seconds: Option<u64>,
}

impl MetricSample {
    /// Reads the sample's value for a named metric key, mirroring the
    /// three keys an alert rule may reference.
    pub fn value_for(&self, metric: &str) -> Option<f64> {
        match metric {
            "cpu_pct" => Some(self.cpu_pct),
            "mem_used_pct" => Some(self.mem_used_pct),
            "disk_used_pct" => Some(self.disk_used_pct),
            _ => None,
        }
    }
}
