use libsql::params;
use lunasentri_domain_models::{AlertRule, Comparator};
use tracing::instrument;

use crate::client::StoreClient;
use crate::errors::StoreError;
use crate::rows::parse_dt;

pub struct AlertRuleRepository {
    client: StoreClient,
}

const SELECT_COLUMNS: &str = "id, name, metric, comparison, threshold_pct, trigger_after, created_at, updated_at";

fn parse_comparison(raw: &str) -> Result<Comparator, StoreError> {
    match raw {
        "above" => Ok(Comparator::Above),
        "below" => Ok(Comparator::Below),
        other => Err(StoreError::Mapping(format!("unknown comparison {other:?}"))),
    }
}

fn comparison_str(c: Comparator) -> &'static str {
    match c {
        Comparator::Above => "above",
        Comparator::Below => "below",
    }
}

fn row_to_rule(row: &libsql::Row) -> Result<AlertRule, StoreError> {
    Ok(AlertRule {
        id: row.get(0)?,
        name: row.get(1)?,
        metric: row.get(2)?,
        comparison: parse_comparison(&row.get::<String>(3)?)?,
        threshold_pct: row.get(4)?,
        trigger_after: row.get::<i64>(5)? as u32,
        created_at: parse_dt(&row.get::<String>(6)?)?,
        updated_at: parse_dt(&row.get::<String>(7)?)?,
    })
}

impl AlertRuleRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<AlertRule>, StoreError> {
        let conn = self.client.connection()?;
        let sql = format!("SELECT {SELECT_COLUMNS} FROM alert_rules ORDER BY name ASC");
        let mut rows = conn.query(&sql, ()).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_rule(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: i64) -> Result<Option<AlertRule>, StoreError> {
        let conn = self.client.connection()?;
        let sql = format!("SELECT {SELECT_COLUMNS} FROM alert_rules WHERE id = ?1");
        let mut rows = conn.query(&sql, params![id]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_rule(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, name))]
    pub async fn create(
        &self,
        name: &str,
        metric: &str,
        comparison: Comparator,
        threshold_pct: f64,
        trigger_after: u32,
    ) -> Result<AlertRule, StoreError> {
        let conn = self.client.connection()?;
        conn.execute(
            "INSERT INTO alert_rules (name, metric, comparison, threshold_pct, trigger_after) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                name,
                metric,
                comparison_str(comparison),
                threshold_pct,
                trigger_after as i64
            ],
        )
        .await?;
        let id = conn.last_insert_rowid();
        self.find_by_id(id).await?.ok_or(StoreError::RuleNotFound)
    }

    #[instrument(skip(self, name))]
    pub async fn update(
        &self,
        id: i64,
        name: &str,
        metric: &str,
        comparison: Comparator,
        threshold_pct: f64,
        trigger_after: u32,
    ) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        let changed = conn
            .execute(
                "UPDATE alert_rules SET name = ?1, metric = ?2, comparison = ?3, threshold_pct = ?4, \
                 trigger_after = ?5, updated_at = CURRENT_TIMESTAMP WHERE id = ?6",
                params![
                    name,
                    metric,
                    comparison_str(comparison),
                    threshold_pct,
                    trigger_after as i64,
                    id
                ],
            )
            .await?;
        if changed == 0 {
            return Err(StoreError::RuleNotFound);
        }
        Ok(())
    }

    /// Deletes the rule's events first; no connection ever enables
    /// `PRAGMA foreign_keys`, so the schema's `ON DELETE CASCADE` is never
    /// actually enforced and orphaned events must be removed by hand (the
    /// same reason `MachineRepository::delete` clears `metric_samples`).
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        conn.execute("DELETE FROM alert_events WHERE rule_id = ?1", params![id])
            .await?;
        let changed = conn
            .execute("DELETE FROM alert_rules WHERE id = ?1", params![id])
            .await?;
        if changed == 0 {
            return Err(StoreError::RuleNotFound);
        }
        Ok(())
    }
}
