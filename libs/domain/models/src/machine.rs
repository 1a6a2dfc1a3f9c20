use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MachineStatus {
    Online,
    Offline,
    Unknown,
}

/// A remote host enrolled by an operator, authenticated via API key.
///
/// `api_key_hash` is a deterministic digest (no per-record salt) — it is a
/// lookup key, not a password verifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    pub id: i64,
    pub owner_operator_id: i64,
    pub name: String,
    pub hostname: Option<String>,
    pub description: Option<String>,
    #[serde(skip_serializing)]
    pub api_key_hash: String,
    pub enabled: bool,
    pub status: MachineStatus,
    pub last_seen: Option<DateTime<Utc>>,
    pub system_info: SystemInfo,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Optional system metadata reported by an agent and persisted as nullable
/// columns on the machine row, filled in incrementally over the life of
/// the registration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemInfo {
    pub platform: Option<String>,
    pub platform_version: Option<String>,
    pub kernel_version: Option<String>,
    pub cpu_cores: Option<u32>,
    pub memory_total_mb: Option<u64>,
    pub disk_total_gb: Option<u64>,
    pub last_boot_time: Option<DateTime<Utc>>,
}

impl Machine {
    /// Freshness window used to derive `online` vs `offline` from `last_seen`.
    pub const ONLINE_WINDOW_SECS: i64 = 60;

    pub fn derive_status(&self, now: DateTime<Utc>) -> MachineStatus {
        match self.last_seen {
            None => MachineStatus::Unknown,
            Some(seen) if (now - seen).num_seconds() <= Self::ONLINE_WINDOW_SECS => {
                MachineStatus::Online
            }
            Some(_) => MachineStatus::Offline,
        }
    }
}
