use libsql::params;
use lunasentri_domain_models::{ChannelState, ChatChannel, DeliveryChannel, WebhookChannel};
use tracing::instrument;

use crate::client::StoreClient;
use crate::errors::StoreError;
use crate::rows::parse_dt_opt;

pub struct ChannelRepository {
    client: StoreClient,
}

const WEBHOOK_COLUMNS: &str = "id, owner_id, url, secret_hash, enabled, failure_count, \
     last_success, last_attempt, last_error_at, cooldown_until";
const CHAT_COLUMNS: &str =
    "id, owner_id, chat_id, enabled, failure_count, last_success, last_attempt, last_error_at, cooldown_until";

fn row_to_state(
    enabled: i64,
    failure_count: i64,
    last_success: Option<String>,
    last_attempt: Option<String>,
    last_error_at: Option<String>,
    cooldown_until: Option<String>,
) -> Result<ChannelState, StoreError> {
    Ok(ChannelState {
        enabled: enabled != 0,
        failure_count: failure_count as u32,
        last_success: parse_dt_opt(last_success)?,
        last_attempt: parse_dt_opt(last_attempt)?,
        last_error_at: parse_dt_opt(last_error_at)?,
        cooldown_until: parse_dt_opt(cooldown_until)?,
    })
}

fn row_to_webhook(row: &libsql::Row) -> Result<WebhookChannel, StoreError> {
    Ok(WebhookChannel {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        url: row.get(2)?,
        secret_hash: row.get(3)?,
        state: row_to_state(
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
            row.get(8)?,
            row.get(9)?,
        )?,
    })
}

fn row_to_chat(row: &libsql::Row) -> Result<ChatChannel, StoreError> {
    Ok(ChatChannel {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        chat_id: row.get(2)?,
        state: row_to_state(
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
            row.get(8)?,
        )?,
    })
}

impl ChannelRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, secret_hash))]
    pub async fn create_webhook(&self, owner_id: i64, url: &str, secret_hash: &str) -> Result<WebhookChannel, StoreError> {
        let conn = self.client.connection()?;
        conn.execute(
            "INSERT INTO webhook_channels (owner_id, url, secret_hash) VALUES (?1, ?2, ?3)",
            params![owner_id, url, secret_hash],
        )
        .await?;
        let id = conn.last_insert_rowid();
        self.find_webhook(id).await?.ok_or(StoreError::ChannelNotFound)
    }

    #[instrument(skip(self))]
    pub async fn find_webhook(&self, id: i64) -> Result<Option<WebhookChannel>, StoreError> {
        let conn = self.client.connection()?;
        let sql = format!("SELECT {WEBHOOK_COLUMNS} FROM webhook_channels WHERE id = ?1");
        let mut rows = conn.query(&sql, params![id]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_webhook(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn list_webhooks_for_owner(&self, owner_id: i64) -> Result<Vec<WebhookChannel>, StoreError> {
        let conn = self.client.connection()?;
        let sql = format!("SELECT {WEBHOOK_COLUMNS} FROM webhook_channels WHERE owner_id = ?1 ORDER BY id ASC");
        let mut rows = conn.query(&sql, params![owner_id]).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_webhook(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(self))]
    pub async fn delete_webhook(&self, id: i64) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        let changed = conn
            .execute("DELETE FROM webhook_channels WHERE id = ?1", params![id])
            .await?;
        if changed == 0 {
            return Err(StoreError::ChannelNotFound);
        }
        Ok(())
    }

    #[instrument(skip(self, url))]
    pub async fn update_webhook(&self, id: i64, url: Option<&str>, enabled: Option<bool>) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        let changed = conn
            .execute(
                "UPDATE webhook_channels SET url = COALESCE(?1, url), enabled = COALESCE(?2, enabled) WHERE id = ?3",
                params![url, enabled.map(|b| b as i64), id],
            )
            .await?;
        if changed == 0 {
            return Err(StoreError::ChannelNotFound);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn create_chat(&self, owner_id: i64, chat_id: &str) -> Result<ChatChannel, StoreError> {
        let conn = self.client.connection()?;
        conn.execute(
            "INSERT INTO chat_channels (owner_id, chat_id) VALUES (?1, ?2)",
            params![owner_id, chat_id],
        )
        .await?;
        let id = conn.last_insert_rowid();
        self.find_chat(id).await?.ok_or(StoreError::ChannelNotFound)
    }

    #[instrument(skip(self))]
    pub async fn find_chat(&self, id: i64) -> Result<Option<ChatChannel>, StoreError> {
        let conn = self.client.connection()?;
        let sql = format!("SELECT {CHAT_COLUMNS} FROM chat_channels WHERE id = ?1");
        let mut rows = conn.query(&sql, params![id]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_chat(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn list_chat_for_owner(&self, owner_id: i64) -> Result<Vec<ChatChannel>, StoreError> {
        let conn = self.client.connection()?;
        let sql = format!("SELECT {CHAT_COLUMNS} FROM chat_channels WHERE owner_id = ?1 ORDER BY id ASC");
        let mut rows = conn.query(&sql, params![owner_id]).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_chat(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(self, chat_id))]
    pub async fn update_chat(&self, id: i64, chat_id: Option<&str>, enabled: Option<bool>) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        let changed = conn
            .execute(
                "UPDATE chat_channels SET chat_id = COALESCE(?1, chat_id), enabled = COALESCE(?2, enabled) WHERE id = ?3",
                params![chat_id, enabled.map(|b| b as i64), id],
            )
            .await?;
        if changed == 0 {
            return Err(StoreError::ChannelNotFound);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_chat(&self, id: i64) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        let changed = conn
            .execute("DELETE FROM chat_channels WHERE id = ?1", params![id])
            .await?;
        if changed == 0 {
            return Err(StoreError::ChannelNotFound);
        }
        Ok(())
    }

    /// Lists every enabled channel across every operator. Alert rules are
    /// global (not owner-scoped), so a firing fans out to the whole
    /// channel set rather than to one operator's subset.
    #[instrument(skip(self))]
    pub async fn list_all_enabled(&self) -> Result<Vec<DeliveryChannel>, StoreError> {
        let conn = self.client.connection()?;
        let mut channels = Vec::new();

        let sql = format!("SELECT {WEBHOOK_COLUMNS} FROM webhook_channels WHERE enabled = 1");
        let mut rows = conn.query(&sql, ()).await?;
        while let Some(row) = rows.next().await? {
            channels.push(DeliveryChannel::Webhook(row_to_webhook(&row)?));
        }

        let sql = format!("SELECT {CHAT_COLUMNS} FROM chat_channels WHERE enabled = 1");
        let mut rows = conn.query(&sql, ()).await?;
        while let Some(row) = rows.next().await? {
            channels.push(DeliveryChannel::Chat(row_to_chat(&row)?));
        }

        Ok(channels)
    }

    /// Lists every enabled channel owned by `owner_id`, webhook and chat
    /// alike, as the single `DeliveryChannel` abstraction the notifier
    /// dispatches over. Used for the operator-facing management surface,
    /// not for fan-out (see [`Self::list_all_enabled`]).
    #[instrument(skip(self))]
    pub async fn list_enabled_for_owner(&self, owner_id: i64) -> Result<Vec<DeliveryChannel>, StoreError> {
        let mut channels = Vec::new();
        for webhook in self.list_webhooks_for_owner(owner_id).await? {
            if webhook.state.enabled {
                channels.push(DeliveryChannel::Webhook(webhook));
            }
        }
        for chat in self.list_chat_for_owner(owner_id).await? {
            if chat.state.enabled {
                channels.push(DeliveryChannel::Chat(chat));
            }
        }
        Ok(channels)
    }

    /// Persists the post-delivery failure/cool-down state back to the
    /// owning row, dispatching on the channel variant.
    #[instrument(skip(self, channel))]
    pub async fn save_state(&self, channel: &DeliveryChannel) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        let state = channel.state();
        let last_success = state.last_success.map(crate::rows::to_rfc3339);
        let last_attempt = state.last_attempt.map(crate::rows::to_rfc3339);
        let last_error_at = state.last_error_at.map(crate::rows::to_rfc3339);
        let cooldown_until = state.cooldown_until.map(crate::rows::to_rfc3339);

        match channel {
            DeliveryChannel::Webhook(w) => {
                conn.execute(
                    "UPDATE webhook_channels SET failure_count = ?1, last_success = ?2, \
                     last_attempt = ?3, last_error_at = ?4, cooldown_until = ?5 WHERE id = ?6",
                    params![
                        state.failure_count as i64,
                        last_success,
                        last_attempt,
                        last_error_at,
                        cooldown_until,
                        w.id
                    ],
                )
                .await?;
            }
            DeliveryChannel::Chat(c) => {
                conn.execute(
                    "UPDATE chat_channels SET failure_count = ?1, last_success = ?2, \
                     last_attempt = ?3, last_error_at = ?4, cooldown_until = ?5 WHERE id = ?6",
                    params![
                        state.failure_count as i64,
                        last_success,
                        last_attempt,
                        last_error_at,
                        cooldown_until,
                        c.id
                    ],
                )
                .await?;
            }
        }
        Ok(())
    }
}
