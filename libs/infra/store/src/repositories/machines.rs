use chrono::{DateTime, Utc};
use libsql::params;
use lunasentri_domain_models::{Machine, MachineStatus, SystemInfo};
use tracing::instrument;

use crate::client::StoreClient;
use crate::errors::StoreError;
use crate::rows::{parse_dt, parse_dt_opt, to_rfc3339};

pub struct MachineRepository {
    client: StoreClient,
}

const SELECT_COLUMNS: &str = "id, owner_operator_id, name, hostname, description, api_key_hash, \
     enabled, last_seen, platform, platform_version, kernel_version, cpu_cores, \
     memory_total_mb, disk_total_gb, last_boot_time, created_at, updated_at";

fn row_to_machine(row: &libsql::Row) -> Result<Machine, StoreError> {
    let last_seen = parse_dt_opt(row.get::<Option<String>>(7)?)?;
    let system_info = SystemInfo {
        platform: row.get(8)?,
        platform_version: row.get(9)?,
        kernel_version: row.get(10)?,
        cpu_cores: row.get::<Option<i64>>(11)?.map(|v| v as u32),
        memory_total_mb: row.get::<Option<i64>>(12)?.map(|v| v as u64),
        disk_total_gb: row.get::<Option<i64>>(13)?.map(|v| v as u64),
        last_boot_time: parse_dt_opt(row.get::<Option<String>>(14)?)?,
    };

    let machine = Machine {
        id: row.get(0)?,
        owner_operator_id: row.get(1)?,
        name: row.get(2)?,
        hostname: row.get(3)?,
        description: row.get(4)?,
        api_key_hash: row.get(5)?,
        enabled: row.get::<i64>(6)? != 0,
        status: MachineStatus::Unknown,
        last_seen,
        system_info,
        created_at: parse_dt(&row.get::<String>(15)?)?,
        updated_at: parse_dt(&row.get::<String>(16)?)?,
    };

    let status = machine.derive_status(Utc::now());
    Ok(Machine { status, ..machine })
}

impl MachineRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, api_key_hash))]
    pub async fn register(
        &self,
        owner_operator_id: i64,
        name: &str,
        hostname: Option<&str>,
        description: Option<&str>,
        api_key_hash: &str,
    ) -> Result<Machine, StoreError> {
        let conn = self.client.connection()?;
        conn.execute(
            "INSERT INTO machines (owner_operator_id, name, hostname, description, api_key_hash) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![owner_operator_id, name, hostname, description, api_key_hash],
        )
        .await?;
        let id = conn.last_insert_rowid();
        self.find_by_id(id).await?.ok_or(StoreError::MachineNotFound)
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Machine>, StoreError> {
        let conn = self.client.connection()?;
        let sql = format!("SELECT {SELECT_COLUMNS} FROM machines WHERE id = ?1");
        let mut rows = conn.query(&sql, params![id]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_machine(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, api_key_hash))]
    pub async fn find_by_api_key_hash(&self, api_key_hash: &str) -> Result<Option<Machine>, StoreError> {
        let conn = self.client.connection()?;
        let sql = format!("SELECT {SELECT_COLUMNS} FROM machines WHERE api_key_hash = ?1");
        let mut rows = conn.query(&sql, params![api_key_hash]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_machine(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn list_for_owner(&self, owner_operator_id: i64) -> Result<Vec<Machine>, StoreError> {
        let conn = self.client.connection()?;
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM machines WHERE owner_operator_id = ?1 ORDER BY id ASC"
        );
        let mut rows = conn.query(&sql, params![owner_operator_id]).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_machine(&row)?);
        }
        Ok(out)
    }

    /// Replaces the stored API-key digest. Atomic with respect to readers:
    /// the prior digest stops authenticating the instant this commits.
    #[instrument(skip(self, new_api_key_hash))]
    pub async fn rotate_key(&self, machine_id: i64, new_api_key_hash: &str) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        let changed = conn
            .execute(
                "UPDATE machines SET api_key_hash = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
                params![new_api_key_hash, machine_id],
            )
            .await?;
        if changed == 0 {
            return Err(StoreError::MachineNotFound);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn set_enabled(&self, machine_id: i64, enabled: bool) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        let changed = conn
            .execute(
                "UPDATE machines SET enabled = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
                params![enabled as i64, machine_id],
            )
            .await?;
        if changed == 0 {
            return Err(StoreError::MachineNotFound);
        }
        Ok(())
    }

    #[instrument(skip(self, name, hostname, description))]
    pub async fn update(
        &self,
        machine_id: i64,
        name: Option<&str>,
        hostname: Option<&str>,
        description: Option<&str>,
    ) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        let changed = conn
            .execute(
                "UPDATE machines SET \
                 name = COALESCE(?1, name), \
                 hostname = COALESCE(?2, hostname), \
                 description = COALESCE(?3, description), \
                 updated_at = CURRENT_TIMESTAMP \
                 WHERE id = ?4",
                params![name, hostname, description, machine_id],
            )
            .await?;
        if changed == 0 {
            return Err(StoreError::MachineNotFound);
        }
        Ok(())
    }

    /// Deletes the machine; history rows cascade via the caller issuing
    /// the companion sample/event cleanup (`ON DELETE CASCADE` only
    /// covers alert_events -> alert_rules, not per-machine history).
    #[instrument(skip(self))]
    pub async fn delete(&self, machine_id: i64) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        conn.execute(
            "DELETE FROM metric_samples WHERE machine_id = ?1",
            params![machine_id],
        )
        .await?;
        let changed = conn
            .execute("DELETE FROM machines WHERE id = ?1", params![machine_id])
            .await?;
        if changed == 0 {
            return Err(StoreError::MachineNotFound);
        }
        Ok(())
    }

    /// Merges newly reported system fields and marks the machine seen.
    #[instrument(skip(self, info))]
    pub async fn touch_seen(
        &self,
        machine_id: i64,
        recorded_at: DateTime<Utc>,
        info: &SystemInfo,
    ) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        conn.execute(
            "UPDATE machines SET \
             last_seen = ?1, \
             platform = COALESCE(?2, platform), \
             platform_version = COALESCE(?3, platform_version), \
             kernel_version = COALESCE(?4, kernel_version), \
             cpu_cores = COALESCE(?5, cpu_cores), \
             memory_total_mb = COALESCE(?6, memory_total_mb), \
             disk_total_gb = COALESCE(?7, disk_total_gb), \
             last_boot_time = COALESCE(?8, last_boot_time), \
             updated_at = CURRENT_TIMESTAMP \
             WHERE id = ?9",
            params![
                to_rfc3339(recorded_at),
                info.platform.clone(),
                info.platform_version.clone(),
                info.kernel_version.clone(),
                info.cpu_cores.map(|v| v as i64),
                info.memory_total_mb.map(|v| v as i64),
                info.disk_total_gb.map(|v| v as i64),
                info.last_boot_time.map(to_rfc3339),
                machine_id,
            ],
        )
        .await?;
        Ok(())
    }
}
