use libsql::params;
use lunasentri_domain_models::AlertEvent;
use tracing::instrument;

use crate::client::StoreClient;
use crate::errors::StoreError;
use crate::rows::{parse_dt, parse_dt_opt, to_rfc3339};
use lunasentri_domain_alerts::RaisedEvent;

pub struct AlertEventRepository {
    client: StoreClient,
}

const SELECT_COLUMNS: &str = "id, rule_id, triggered_at, value, acknowledged, acknowledged_at";

fn row_to_event(row: &libsql::Row) -> Result<AlertEvent, StoreError> {
    Ok(AlertEvent {
        id: row.get(0)?,
        rule_id: row.get(1)?,
        triggered_at: parse_dt(&row.get::<String>(2)?)?,
        value: row.get(3)?,
        acknowledged: row.get::<i64>(4)? != 0,
        acknowledged_at: parse_dt_opt(row.get::<Option<String>>(5)?)?,
    })
}

impl AlertEventRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, raised))]
    pub async fn record(&self, raised: &RaisedEvent) -> Result<AlertEvent, StoreError> {
        let conn = self.client.connection()?;
        conn.execute(
            "INSERT INTO alert_events (rule_id, triggered_at, value) VALUES (?1, ?2, ?3)",
            params![raised.rule_id, to_rfc3339(raised.triggered_at), raised.value],
        )
        .await?;
        let id = conn.last_insert_rowid();
        self.find_by_id(id).await?.ok_or(StoreError::EventNotFound)
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: i64) -> Result<Option<AlertEvent>, StoreError> {
        let conn = self.client.connection()?;
        let sql = format!("SELECT {SELECT_COLUMNS} FROM alert_events WHERE id = ?1");
        let mut rows = conn.query(&sql, params![id]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_event(&row)?)),
            None => Ok(None),
        }
    }

    /// Unacknowledged first, then newest-first.
    #[instrument(skip(self))]
    pub async fn list(&self, limit: i64) -> Result<Vec<AlertEvent>, StoreError> {
        let conn = self.client.connection()?;
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM alert_events \
             ORDER BY acknowledged ASC, triggered_at DESC LIMIT ?1"
        );
        let mut rows = conn.query(&sql, params![limit]).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_event(&row)?);
        }
        Ok(out)
    }

    /// Transitions `acknowledged` from false to true exactly once; a
    /// repeat call finds no matching row and reports not-found.
    #[instrument(skip(self))]
    pub async fn acknowledge(&self, id: i64) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        let changed = conn
            .execute(
                "UPDATE alert_events SET acknowledged = 1, acknowledged_at = CURRENT_TIMESTAMP \
                 WHERE id = ?1 AND acknowledged = 0",
                params![id],
            )
            .await?;
        if changed == 0 {
            return Err(StoreError::EventNotFound);
        }
        Ok(())
    }
}
