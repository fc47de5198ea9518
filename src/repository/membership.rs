//! Membership repository.

use crate::domain::{AccountRole, Membership, StringUuid};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Role of the active membership, if any. `None` covers both "never a
    /// member" and "deactivated member"; the resolver treats them the same.
    async fn role_of(
        &self,
        user_id: StringUuid,
        account_id: StringUuid,
    ) -> Result<Option<AccountRole>>;
    async fn find(
        &self,
        user_id: StringUuid,
        account_id: StringUuid,
    ) -> Result<Option<Membership>>;
    /// Provision a membership. One role per `(user, account)`: re-provisioning
    /// updates the role and re-activates the row.
    async fn create(
        &self,
        user_id: StringUuid,
        account_id: StringUuid,
        role: AccountRole,
    ) -> Result<Membership>;
    async fn deactivate(&self, user_id: StringUuid, account_id: StringUuid) -> Result<bool>;
}

pub struct MembershipRepositoryImpl {
    pool: MySqlPool,
}

impl MembershipRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipRepository for MembershipRepositoryImpl {
    async fn role_of(
        &self,
        user_id: StringUuid,
        account_id: StringUuid,
    ) -> Result<Option<AccountRole>> {
        sqlx::query_scalar::<_, AccountRole>(
            "SELECT role FROM account_members WHERE user_id = ? AND account_id = ? AND is_active = TRUE",
        )
        .bind(user_id)
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn find(
        &self,
        user_id: StringUuid,
        account_id: StringUuid,
    ) -> Result<Option<Membership>> {
        sqlx::query_as::<_, Membership>(
            r#"
            SELECT id, user_id, account_id, role, is_active, created_at
            FROM account_members
            WHERE user_id = ? AND account_id = ?
            "#,
        )
        .bind(user_id)
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn create(
        &self,
        user_id: StringUuid,
        account_id: StringUuid,
        role: AccountRole,
    ) -> Result<Membership> {
        sqlx::query(
            r#"
            INSERT INTO account_members (user_id, account_id, role, is_active, created_at)
            VALUES (?, ?, ?, TRUE, NOW())
            ON DUPLICATE KEY UPDATE role = VALUES(role), is_active = TRUE
            "#,
        )
        .bind(user_id)
        .bind(account_id)
        .bind(role)
        .execute(&self.pool)
        .await?;

        self.find(user_id, account_id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create membership")))
    }

    async fn deactivate(&self, user_id: StringUuid, account_id: StringUuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE account_members SET is_active = FALSE WHERE user_id = ? AND account_id = ?",
        )
        .bind(user_id)
        .bind(account_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
