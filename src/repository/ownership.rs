//! Ownership repository.
//!
//! Ownership rows are the first thing every resolution consults; an active
//! row short-circuits all other checks. Rows are deactivated on transfer,
//! never deleted.

use crate::domain::{Ownership, StringUuid};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OwnershipRepository: Send + Sync {
    /// True iff an active ownership row exists for the pair. A deactivated
    /// row behaves identically to no row.
    async fn is_owner(&self, user_id: StringUuid, account_id: StringUuid) -> Result<bool>;
    async fn find(&self, user_id: StringUuid, account_id: StringUuid)
        -> Result<Option<Ownership>>;
    /// Record ownership. Re-provisioning an existing pair re-activates the
    /// row instead of duplicating it.
    async fn create(&self, user_id: StringUuid, account_id: StringUuid) -> Result<Ownership>;
    async fn deactivate(&self, user_id: StringUuid, account_id: StringUuid) -> Result<bool>;
}

pub struct OwnershipRepositoryImpl {
    pool: MySqlPool,
}

impl OwnershipRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OwnershipRepository for OwnershipRepositoryImpl {
    async fn is_owner(&self, user_id: StringUuid, account_id: StringUuid) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM account_owners WHERE user_id = ? AND account_id = ? AND is_active = TRUE",
        )
        .bind(user_id)
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    async fn find(
        &self,
        user_id: StringUuid,
        account_id: StringUuid,
    ) -> Result<Option<Ownership>> {
        sqlx::query_as::<_, Ownership>(
            "SELECT id, user_id, account_id, is_active, created_at FROM account_owners WHERE user_id = ? AND account_id = ?",
        )
        .bind(user_id)
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn create(&self, user_id: StringUuid, account_id: StringUuid) -> Result<Ownership> {
        sqlx::query(
            r#"
            INSERT INTO account_owners (user_id, account_id, is_active, created_at)
            VALUES (?, ?, TRUE, NOW())
            ON DUPLICATE KEY UPDATE is_active = TRUE
            "#,
        )
        .bind(user_id)
        .bind(account_id)
        .execute(&self.pool)
        .await?;

        self.find(user_id, account_id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create ownership")))
    }

    async fn deactivate(&self, user_id: StringUuid, account_id: StringUuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE account_owners SET is_active = FALSE WHERE user_id = ? AND account_id = ?",
        )
        .bind(user_id)
        .bind(account_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
