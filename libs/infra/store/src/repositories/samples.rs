use libsql::params;
use lunasentri_domain_models::MetricSample;
use tracing::instrument;

use crate::client::StoreClient;
use crate::errors::StoreError;
use crate::rows::{parse_dt, to_rfc3339};

pub struct SampleRepository {
    client: StoreClient,
}

fn row_to_sample(row: &libsql::Row) -> Result<MetricSample, StoreError> {
    Ok(MetricSample {
        machine_id: row.get(0)?,
        recorded_at: parse_dt(&row.get::<String>(1)?)?,
        cpu_pct: row.get(2)?,
        mem_used_pct: row.get(3)?,
        disk_used_pct: row.get(4)?,
        net_rx_bytes: row.get::<Option<i64>>(5)?.map(|v| v as u64),
        net_tx_bytes: row.get::<Option<i64>>(6)?.map(|v| v as u64),
        uptime_seconds: row.get::<Option<i64>>(7)?.map(|v| v as u64),
    })
}

const SELECT_COLUMNS: &str =
    "machine_id, recorded_at, cpu_pct, mem_used_pct, disk_used_pct, net_rx_bytes, net_tx_bytes, uptime_seconds";

impl SampleRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    /// Append-only: duplicate samples are legal and expected to advance
    /// the breach counter when an agent retries.
    #[instrument(skip(self, sample))]
    pub async fn append(&self, sample: &MetricSample) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        conn.execute(
            "INSERT INTO metric_samples \
             (machine_id, recorded_at, cpu_pct, mem_used_pct, disk_used_pct, net_rx_bytes, net_tx_bytes, uptime_seconds) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                sample.machine_id,
                to_rfc3339(sample.recorded_at),
                sample.cpu_pct,
                sample.mem_used_pct,
                sample.disk_used_pct,
                sample.net_rx_bytes.map(|v| v as i64),
                sample.net_tx_bytes.map(|v| v as i64),
                sample.uptime_seconds.map(|v| v as i64),
            ],
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn latest_for_machine(&self, machine_id: i64) -> Result<Option<MetricSample>, StoreError> {
        let conn = self.client.connection()?;
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM metric_samples WHERE machine_id = ?1 ORDER BY recorded_at DESC LIMIT 1"
        );
        let mut rows = conn.query(&sql, params![machine_id]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_sample(&row)?)),
            None => Ok(None),
        }
    }
}
