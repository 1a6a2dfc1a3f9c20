use chrono::Utc;
use libsql::params;
use lunasentri_domain_models::Operator;
use tracing::instrument;

use crate::client::StoreClient;
use crate::errors::StoreError;
use crate::rows::parse_dt;

pub struct OperatorRepository {
    client: StoreClient,
}

fn row_to_operator(row: &libsql::Row) -> Result<Operator, StoreError> {
    Ok(Operator {
        id: row.get(0)?,
        email: row.get(1)?,
        password_verifier: row.get(2)?,
        is_admin: row.get::<i64>(3)? != 0,
        created_at: parse_dt(&row.get::<String>(4)?)?,
    })
}

const SELECT_COLUMNS: &str = "id, email, password_verifier, is_admin, created_at";

impl OperatorRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    /// The first operator ever created is automatically admin.
    #[instrument(skip(self, password_verifier))]
    pub async fn register(&self, email: &str, password_verifier: &str) -> Result<Operator, StoreError> {
        let conn = self.client.connection()?;
        let normalized_email = email.to_lowercase();

        let mut existing = conn
            .query("SELECT 1 FROM operators WHERE email = ?1", params![normalized_email.clone()])
            .await?;
        if existing.next().await?.is_some() {
            return Err(StoreError::DuplicateEmail);
        }

        let mut count_rows = conn.query("SELECT COUNT(*) FROM operators", ()).await?;
        let existing_count: i64 = count_rows.next().await?.map(|r| r.get(0)).transpose()?.unwrap_or(0);
        let is_admin = existing_count == 0;

        conn.execute(
            "INSERT INTO operators (email, password_verifier, is_admin) VALUES (?1, ?2, ?3)",
            params![normalized_email.clone(), password_verifier, is_admin as i64],
        )
        .await?;

        let id = conn.last_insert_rowid();
        self.find_by_id(id).await?.ok_or(StoreError::OperatorNotFound)
    }

    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Operator>, StoreError> {
        let conn = self.client.connection()?;
        let sql = format!("SELECT {SELECT_COLUMNS} FROM operators WHERE email = ?1");
        let mut rows = conn.query(&sql, params![email.to_lowercase()]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_operator(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Operator>, StoreError> {
        let conn = self.client.connection()?;
        let sql = format!("SELECT {SELECT_COLUMNS} FROM operators WHERE id = ?1");
        let mut rows = conn.query(&sql, params![id]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_operator(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Operator>, StoreError> {
        let conn = self.client.connection()?;
        let sql = format!("SELECT {SELECT_COLUMNS} FROM operators ORDER BY id ASC");
        let mut rows = conn.query(&sql, ()).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_operator(&row)?);
        }
        Ok(out)
    }

    pub async fn count_admins(&self) -> Result<i64, StoreError> {
        let conn = self.client.connection()?;
        let mut rows = conn
            .query("SELECT COUNT(*) FROM operators WHERE is_admin = 1", ())
            .await?;
        Ok(rows.next().await?.map(|r| r.get(0)).transpose()?.unwrap_or(0))
    }

    /// Requires current-password verification upstream; this only writes
    /// the new verifier.
    #[instrument(skip(self, new_verifier))]
    pub async fn update_password_verifier(&self, operator_id: i64, new_verifier: &str) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        let changed = conn
            .execute(
                "UPDATE operators SET password_verifier = ?1 WHERE id = ?2",
                params![new_verifier, operator_id],
            )
            .await?;
        if changed == 0 {
            return Err(StoreError::OperatorNotFound);
        }
        Ok(())
    }

    /// Deletes an operator, enforcing the last-admin invariant: at least
    /// one admin must remain whenever any operator exists.
    #[instrument(skip(self))]
    pub async fn delete(&self, operator_id: i64) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        let target = self.find_by_id(operator_id).await?.ok_or(StoreError::OperatorNotFound)?;

        if target.is_admin && self.count_admins().await? <= 1 {
            return Err(StoreError::LastAdminProtected);
        }

        let changed = conn
            .execute("DELETE FROM operators WHERE id = ?1", params![operator_id])
            .await?;
        if changed == 0 {
            return Err(StoreError::OperatorNotFound);
        }
        Ok(())
    }

    #[instrument(skip(self, token_digest))]
    pub async fn store_reset_token(
        &self,
        operator_id: i64,
        token_digest: &str,
        expires_at: chrono::DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        conn.execute(
            "DELETE FROM reset_tokens WHERE operator_id = ?1",
            params![operator_id],
        )
        .await?;
        conn.execute(
            "INSERT INTO reset_tokens (token_digest, operator_id, expires_at) VALUES (?1, ?2, ?3)",
            params![token_digest, operator_id, crate::rows::to_rfc3339(expires_at)],
        )
        .await?;
        Ok(())
    }

    /// Consumes a reset token exactly once: returns the owning operator id
    /// if the digest is known, unexpired, and unused, then marks it used.
    #[instrument(skip(self, token_digest))]
    pub async fn consume_reset_token(&self, token_digest: &str) -> Result<Option<i64>, StoreError> {
        let conn = self.client.connection()?;
        let mut rows = conn
            .query(
                "SELECT operator_id, expires_at, used FROM reset_tokens WHERE token_digest = ?1",
                params![token_digest],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let operator_id: i64 = row.get(0)?;
        let expires_at = parse_dt(&row.get::<String>(1)?)?;
        let used: i64 = row.get(2)?;

        if used != 0 || expires_at <= Utc::now() {
            return Ok(None);
        }

        conn.execute(
            "UPDATE reset_tokens SET used = 1 WHERE token_digest = ?1",
            params![token_digest],
        )
        .await?;

        Ok(Some(operator_id))
    }

    /// Invalidates every outstanding reset token for an operator, used
    /// after a successful reset or an explicit password change.
    #[instrument(skip(self))]
    pub async fn invalidate_reset_tokens(&self, operator_id: i64) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        conn.execute(
            "UPDATE reset_tokens SET used = 1 WHERE operator_id = ?1",
            params![operator_id],
        )
        .await?;
        Ok(())
    }
}
