use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument, warn};

/// Base tables, applied with `CREATE TABLE IF NOT EXISTS`.
const TABLES: &[(&str, &str)] = &[
    (
        "operators",
        r#"
        CREATE TABLE IF NOT EXISTS operators (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            password_verifier TEXT NOT NULL,
            is_admin INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );
    "#,
    ),
    (
        "machines",
        r#"
        CREATE TABLE IF NOT EXISTS machines (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_operator_id INTEGER NOT NULL REFERENCES operators(id),
            name TEXT NOT NULL,
            hostname TEXT,
            description TEXT,
            api_key_hash TEXT NOT NULL UNIQUE,
            enabled INTEGER NOT NULL DEFAULT 1,
            last_seen TEXT,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );
    "#,
    ),
    (
        "metric_samples",
        r#"
        CREATE TABLE IF NOT EXISTS metric_samples (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            machine_id INTEGER NOT NULL REFERENCES machines(id),
            recorded_at TEXT NOT NULL,
            cpu_pct REAL NOT NULL,
            mem_used_pct REAL NOT NULL,
            disk_used_pct REAL NOT NULL,
            net_rx_bytes INTEGER,
            net_tx_bytes INTEGER,
            uptime_seconds INTEGER
        );
    "#,
    ),
    (
        "alert_rules",
        r#"
        CREATE TABLE IF NOT EXISTS alert_rules (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            metric TEXT NOT NULL,
            comparison TEXT NOT NULL,
            threshold_pct REAL NOT NULL,
            trigger_after INTEGER NOT NULL,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );
    "#,
    ),
    // `ON DELETE CASCADE` below is not actually enforced: no connection in
    // this crate runs `PRAGMA foreign_keys = ON`, so SQLite/libSQL leave FK
    // enforcement off by default. `AlertRuleRepository::delete` removes the
    // rule's events itself; keep that in sync with this constraint.
    (
        "alert_events",
        r#"
        CREATE TABLE IF NOT EXISTS alert_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            rule_id INTEGER NOT NULL REFERENCES alert_rules(id) ON DELETE CASCADE,
            triggered_at TEXT NOT NULL,
            value REAL NOT NULL,
            acknowledged INTEGER NOT NULL DEFAULT 0,
            acknowledged_at TEXT
        );
    "#,
    ),
    (
        "webhook_channels",
        r#"
        CREATE TABLE IF NOT EXISTS webhook_channels (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id INTEGER NOT NULL REFERENCES operators(id),
            url TEXT NOT NULL,
            secret_hash TEXT NOT NULL,
            enabled INTEGER NOT NULL DEFAULT 1,
            failure_count INTEGER NOT NULL DEFAULT 0,
            last_success TEXT,
            last_attempt TEXT,
            last_error_at TEXT,
            cooldown_until TEXT
        );
    "#,
    ),
    (
        "chat_channels",
        r#"
        CREATE TABLE IF NOT EXISTS chat_channels (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id INTEGER NOT NULL REFERENCES operators(id),
            chat_id TEXT NOT NULL,
            enabled INTEGER NOT NULL DEFAULT 1,
            failure_count INTEGER NOT NULL DEFAULT 0,
            last_success TEXT,
            last_attempt TEXT,
            last_error_at TEXT,
            cooldown_until TEXT
        );
    "#,
    ),
    (
        "reset_tokens",
        r#"
        CREATE TABLE IF NOT EXISTS reset_tokens (
            token_digest TEXT PRIMARY KEY,
            operator_id INTEGER NOT NULL REFERENCES operators(id),
            expires_at TEXT NOT NULL,
            used INTEGER NOT NULL DEFAULT 0
        );
    "#,
    ),
];

/// System metadata columns, added incrementally so existing rows don't
/// need to be migrated — an agent that never reports `cpu_cores` just
/// leaves the column `NULL`.
const EVOLUTIONARY_COLUMNS: &[(&str, &str)] = &[
    ("machines.platform", "ALTER TABLE machines ADD COLUMN platform TEXT"),
    (
        "machines.platform_version",
        "ALTER TABLE machines ADD COLUMN platform_version TEXT",
    ),
    (
        "machines.kernel_version",
        "ALTER TABLE machines ADD COLUMN kernel_version TEXT",
    ),
    ("machines.cpu_cores", "ALTER TABLE machines ADD COLUMN cpu_cores INTEGER"),
    (
        "machines.memory_total_mb",
        "ALTER TABLE machines ADD COLUMN memory_total_mb INTEGER",
    ),
    (
        "machines.disk_total_gb",
        "ALTER TABLE machines ADD COLUMN disk_total_gb INTEGER",
    ),
    (
        "machines.last_boot_time",
        "ALTER TABLE machines ADD COLUMN last_boot_time TEXT",
    ),
];

const INDEXES: &[(&str, &str)] = &[
    (
        "idx_machines_owner",
        "CREATE INDEX IF NOT EXISTS idx_machines_owner ON machines(owner_operator_id);",
    ),
    (
        "idx_samples_machine_recorded",
        "CREATE INDEX IF NOT EXISTS idx_samples_machine_recorded ON metric_samples(machine_id, recorded_at DESC);",
    ),
    (
        "idx_events_ack_triggered",
        "CREATE INDEX IF NOT EXISTS idx_events_ack_triggered ON alert_events(acknowledged, triggered_at DESC);",
    ),
    (
        "idx_webhooks_owner",
        "CREATE INDEX IF NOT EXISTS idx_webhooks_owner ON webhook_channels(owner_id);",
    ),
    (
        "idx_chat_owner",
        "CREATE INDEX IF NOT EXISTS idx_chat_owner ON chat_channels(owner_id);",
    ),
];

#[instrument(skip(conn))]
pub async fn apply_schema(conn: &Connection) -> Result<()> {
    info!("applying store schema");
    create_tables(conn).await?;
    add_evolutionary_columns(conn).await?;
    create_indexes(conn).await?;
    info!("store schema current");
    Ok(())
}

async fn create_tables(conn: &Connection) -> Result<()> {
    for (name, sql) in TABLES {
        debug!(table = name, "creating table");
        conn.execute(sql, ())
            .await
            .with_context(|| format!("failed to create table {name}"))?;
    }
    Ok(())
}

async fn add_evolutionary_columns(conn: &Connection) -> Result<()> {
    for (name, sql) in EVOLUTIONARY_COLUMNS {
        match conn.execute(sql, ()).await {
            Ok(_) => debug!(column = name, "added column"),
            Err(e) if e.to_string().contains("duplicate column name") => {
                debug!(column = name, "column already present")
            }
            Err(e) => warn!(column = name, error = %e, "evolutionary migration skipped"),
        }
    }
    Ok(())
}

async fn create_indexes(conn: &Connection) -> Result<()> {
    for (name, sql) in INDEXES {
        debug!(index = name, "creating index");
        conn.execute(sql, ())
            .await
            .with_context(|| format!("failed to create index {name}"))?;
    }
    Ok(())
}
