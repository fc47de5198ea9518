//! Individual grant repository.
//!
//! Grants are keyed by `(user, account, permission_key)`: re-granting
//! refreshes the existing row. Revocation flips `is_active` and keeps the
//! row for audit. Expiry is never stored; validity is computed against
//! `NOW()` in the queries that matter.

use crate::domain::{Grant, GrantInput, StringUuid};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;
use std::collections::BTreeSet;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GrantRepository: Send + Sync {
    /// Upsert keyed by `(user, account, key)`. A re-grant re-activates the
    /// row and refreshes `granted_by`, `granted_at`, `expires_at` and
    /// `notes`.
    async fn upsert(&self, input: &GrantInput) -> Result<Grant>;
    /// Deactivate one grant; the row is retained. Returns false when no
    /// such grant exists.
    async fn revoke(
        &self,
        user_id: StringUuid,
        account_id: StringUuid,
        permission_key: &str,
    ) -> Result<bool>;
    /// Transactional full replace: every existing grant row for the pair is
    /// deleted and one fresh active row inserted per key. A concurrent
    /// reader sees the old set or the new set, never a mix.
    async fn replace_all(
        &self,
        user_id: StringUuid,
        account_id: StringUuid,
        permission_keys: &BTreeSet<String>,
        granted_by: StringUuid,
        notes: Option<String>,
    ) -> Result<()>;
    /// Keys of grants that are active and unexpired right now.
    async fn active_keys(
        &self,
        user_id: StringUuid,
        account_id: StringUuid,
    ) -> Result<BTreeSet<String>>;
    async fn find(
        &self,
        user_id: StringUuid,
        account_id: StringUuid,
        permission_key: &str,
    ) -> Result<Option<Grant>>;
    /// Every grant row for the pair, including revoked and expired ones.
    async fn list(&self, user_id: StringUuid, account_id: StringUuid) -> Result<Vec<Grant>>;
}

pub struct GrantRepositoryImpl {
    pool: MySqlPool,
}

impl GrantRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GrantRepository for GrantRepositoryImpl {
    async fn upsert(&self, input: &GrantInput) -> Result<Grant> {
        let user_id = StringUuid::from(input.user_id);
        let account_id = StringUuid::from(input.account_id);

        sqlx::query(
            r#"
            INSERT INTO account_grants
                (user_id, account_id, permission_key, granted_by, is_active, granted_at, expires_at, notes)
            VALUES (?, ?, ?, ?, TRUE, NOW(), ?, ?)
            ON DUPLICATE KEY UPDATE
                granted_by = VALUES(granted_by),
                is_active = TRUE,
                granted_at = NOW(),
                expires_at = VALUES(expires_at),
                notes = VALUES(notes)
            "#,
        )
        .bind(user_id)
        .bind(account_id)
        .bind(&input.permission_key)
        .bind(StringUuid::from(input.granted_by))
        .bind(input.expires_at)
        .bind(&input.notes)
        .execute(&self.pool)
        .await?;

        self.find(user_id, account_id, &input.permission_key)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create grant")))
    }

    async fn revoke(
        &self,
        user_id: StringUuid,
        account_id: StringUuid,
        permission_key: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE account_grants SET is_active = FALSE
            WHERE user_id = ? AND account_id = ? AND permission_key = ?
            "#,
        )
        .bind(user_id)
        .bind(account_id)
        .bind(permission_key)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn replace_all(
        &self,
        user_id: StringUuid,
        account_id: StringUuid,
        permission_keys: &BTreeSet<String>,
        granted_by: StringUuid,
        notes: Option<String>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM account_grants WHERE user_id = ? AND account_id = ?")
            .bind(user_id)
            .bind(account_id)
            .execute(&mut *tx)
            .await?;

        for key in permission_keys {
            sqlx::query(
                r#"
                INSERT INTO account_grants
                    (user_id, account_id, permission_key, granted_by, is_active, granted_at, expires_at, notes)
                VALUES (?, ?, ?, ?, TRUE, NOW(), NULL, ?)
                "#,
            )
            .bind(user_id)
            .bind(account_id)
            .bind(key)
            .bind(granted_by)
            .bind(notes.as_deref())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn active_keys(
        &self,
        user_id: StringUuid,
        account_id: StringUuid,
    ) -> Result<BTreeSet<String>> {
        let keys: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT permission_key FROM account_grants
            WHERE user_id = ? AND account_id = ?
              AND is_active = TRUE
              AND (expires_at IS NULL OR expires_at > NOW())
            "#,
        )
        .bind(user_id)
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(keys.into_iter().collect())
    }

    async fn find(
        &self,
        user_id: StringUuid,
        account_id: StringUuid,
        permission_key: &str,
    ) -> Result<Option<Grant>> {
        sqlx::query_as::<_, Grant>(
            r#"
            SELECT id, user_id, account_id, permission_key, granted_by, is_active, granted_at, expires_at, notes
            FROM account_grants
            WHERE user_id = ? AND account_id = ? AND permission_key = ?
            "#,
        )
        .bind(user_id)
        .bind(account_id)
        .bind(permission_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn list(&self, user_id: StringUuid, account_id: StringUuid) -> Result<Vec<Grant>> {
        sqlx::query_as::<_, Grant>(
            r#"
            SELECT id, user_id, account_id, permission_key, granted_by, is_active, granted_at, expires_at, notes
            FROM account_grants
            WHERE user_id = ? AND account_id = ?
            ORDER BY permission_key
            "#,
        )
        .bind(user_id)
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }
}
