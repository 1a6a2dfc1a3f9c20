use std::time::Duration as StdDuration;

use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sysinfo::{Disks, System};

use lunasentri_domain_models::{Machine, MetricSample, SystemInfo};

use crate::error::ApiError;
use crate::middleware::OperatorIdentity;
use crate::state::AppState;

const LOCAL_METRICS_DEADLINE: StdDuration = StdDuration::from_secs(3);

/// Placeholder machine id for a sample that never touches the store — the
/// local-host-metrics path reads the running process's own host, not any
/// registered machine.
const LOCAL_HOST_MACHINE_ID: i64 = 0;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct IngestSystemInfo {
    pub hostname: Option<String>,
    pub platform: Option<String>,
    pub platform_version: Option<String>,
    pub kernel_version: Option<String>,
    pub cpu_cores: Option<u32>,
    pub memory_total_mb: Option<u64>,
    pub disk_total_gb: Option<u64>,
    pub last_boot_time: Option<DateTime<Utc>>,
}

impl From<IngestSystemInfo> for SystemInfo {
    fn from(v: IngestSystemInfo) -> Self {
        SystemInfo {
            platform: v.platform,
            platform_version: v.platform_version,
            kernel_version: v.kernel_version,
            cpu_cores: v.cpu_cores,
            memory_total_mb: v.memory_total_mb,
            disk_total_gb: v.disk_total_gb,
            last_boot_time: v.last_boot_time,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub cpu_pct: f64,
    pub mem_used_pct: f64,
    pub disk_used_pct: f64,
    pub net_rx_bytes: Option<u64>,
    pub net_tx_bytes: Option<u64>,
    pub uptime_s: Option<u64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub system_info: Option<IngestSystemInfo>,
}

fn validate_pct(name: &str, value: f64) -> Result<(), ApiError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(ApiError::Validation(format!("{name} must be in [0, 100]")));
    }
    Ok(())
}

/// Within ±5 min of now, the supplied timestamp is used verbatim. Outside
/// that but still inside [-1h, +5min], `now` is substituted. Outside the
/// wider window the payload is refused entirely.
const TIMESTAMP_TOLERANCE_SECS: i64 = 300;
const TIMESTAMP_MAX_AGE_SECS: i64 = 3600;
const TIMESTAMP_MAX_SKEW_SECS: i64 = 300;

fn resolve_recorded_at(now: DateTime<Utc>, supplied: Option<DateTime<Utc>>) -> Result<DateTime<Utc>, ApiError> {
    let Some(ts) = supplied else {
        return Ok(now);
    };
    let age = (now - ts).num_seconds();
    if age > TIMESTAMP_MAX_AGE_SECS || age < -TIMESTAMP_MAX_SKEW_SECS {
        return Err(ApiError::Validation("timestamp outside acceptable window".into()));
    }
    if age.abs() <= TIMESTAMP_TOLERANCE_SECS {
        Ok(ts)
    } else {
        Ok(now)
    }
}

/// The ingestion entry point. Steps run in the order the alert pipeline
/// depends on: validate, record, update liveness, then evaluate.
pub async fn ingest(
    Extension(machine): Extension<Machine>,
    State(state): State<AppState>,
    Json(body): Json<IngestRequest>,
) -> Result<StatusCode, ApiError> {
    validate_pct("cpu_pct", body.cpu_pct)?;
    validate_pct("mem_used_pct", body.mem_used_pct)?;
    validate_pct("disk_used_pct", body.disk_used_pct)?;

    let now = Utc::now();
    let recorded_at = resolve_recorded_at(now, body.timestamp)?;

    let sample = MetricSample {
        machine_id: machine.id,
        recorded_at,
        cpu_pct: body.cpu_pct,
        mem_used_pct: body.mem_used_pct,
        disk_used_pct: body.disk_used_pct,
        net_rx_bytes: body.net_rx_bytes,
        net_tx_bytes: body.net_tx_bytes,
        uptime_seconds: body.uptime_s,
    };
    state.samples.append(&sample).await?;

    let system_info: SystemInfo = body.system_info.clone().map(Into::into).unwrap_or_default();
    state.machines.touch_seen(machine.id, recorded_at, &system_info).await?;
    if let Some(hostname) = body.system_info.and_then(|info| info.hostname) {
        state.machines.update(machine.id, None, Some(&hostname), None).await?;
    }

    let rules = state.alert_rules.list().await?;
    let raised = state.alert_engine.evaluate(&sample, &rules);
    for r in raised {
        let event = state.alert_events.record(&r).await?;
        if let Some(rule) = rules.iter().find(|rule| rule.id == r.rule_id) {
            state.notifier.notify(rule.clone(), event);
        }
    }

    Ok(StatusCode::ACCEPTED)
}

#[derive(Debug, Deserialize)]
pub struct MachineQuery {
    pub machine_id: Option<i64>,
}

pub async fn latest_metrics(
    Extension(identity): Extension<OperatorIdentity>,
    State(state): State<AppState>,
    Query(query): Query<MachineQuery>,
) -> Result<Json<MetricSample>, ApiError> {
    match query.machine_id {
        Some(machine_id) => {
            let machine = state.machines.find_by_id(machine_id).await?.ok_or(ApiError::NotFound)?;
            if machine.owner_operator_id != identity.operator_id {
                return Err(ApiError::Forbidden);
            }
            let sample = state.samples.latest_for_machine(machine_id).await?.ok_or(ApiError::NotFound)?;
            Ok(Json(sample))
        }
        None if state.config.local_host_metrics => Ok(Json(local_host_sample().await)),
        None => Err(ApiError::Unprocessable("machine_id is required".into())),
    }
}

pub async fn system_info(
    Extension(identity): Extension<OperatorIdentity>,
    State(state): State<AppState>,
    Query(query): Query<MachineQuery>,
) -> Result<Json<SystemInfo>, ApiError> {
    let machine_id = query.machine_id.ok_or_else(|| ApiError::Validation("machine_id is required".into()))?;
    let machine = state.machines.find_by_id(machine_id).await?.ok_or(ApiError::NotFound)?;
    if machine.owner_operator_id != identity.operator_id {
        return Err(ApiError::Forbidden);
    }
    Ok(Json(machine.system_info))
}

/// Reads host CPU/memory/disk within a bounded deadline, falling back to a
/// zeroed sample rather than propagating a sampler failure to the client.
pub(crate) async fn local_host_sample() -> MetricSample {
    match tokio::time::timeout(LOCAL_METRICS_DEADLINE, tokio::task::spawn_blocking(collect_local_sample)).await {
        Ok(Ok(sample)) => sample,
        _ => zeroed_sample(),
    }
}

fn collect_local_sample() -> MetricSample {
    let mut sys = System::new_all();
    sys.refresh_cpu_usage();
    std::thread::sleep(StdDuration::from_millis(200));
    sys.refresh_cpu_usage();
    let cpu_pct = sys.global_cpu_usage() as f64;

    sys.refresh_memory();
    let mem_used_pct = if sys.total_memory() > 0 {
        (sys.used_memory() as f64 / sys.total_memory() as f64) * 100.0
    } else {
        0.0
    };

    let disks = Disks::new_with_refreshed_list();
    let (disk_total, disk_available) = disks
        .list()
        .iter()
        .fold((0u64, 0u64), |(total, available), disk| {
            (total + disk.total_space(), available + disk.available_space())
        });
    let disk_used_pct = if disk_total > 0 {
        ((disk_total - disk_available) as f64 / disk_total as f64) * 100.0
    } else {
        0.0
    };

    MetricSample {
        machine_id: LOCAL_HOST_MACHINE_ID,
        recorded_at: Utc::now(),
        cpu_pct,
        mem_used_pct,
        disk_used_pct,
        net_rx_bytes: None,
        net_tx_bytes: None,
        uptime_seconds: Some(System::uptime()),
    }
}

fn zeroed_sample() -> MetricSample {
    MetricSample {
        machine_id: LOCAL_HOST_MACHINE_ID,
        recorded_at: Utc::now(),
        cpu_pct: 0.0,
        mem_used_pct: 0.0,
        disk_used_pct: 0.0,
        net_rx_bytes: None,
        net_tx_bytes: None,
        uptime_seconds: None,
    }
}
