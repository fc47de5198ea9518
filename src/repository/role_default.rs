//! Role-default repository.
//!
//! This table is written by exactly one operation: the bootstrap re-seed,
//! which replaces the whole table inside a transaction. A partial clear
//! would transiently deny every member, so clear and insert are
//! indivisible.

use crate::catalog::RoleDefaultSeed;
use crate::domain::AccountRole;
use crate::error::Result;
use async_trait::async_trait;
use sqlx::MySqlPool;
use std::collections::BTreeSet;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleDefaultsRepository: Send + Sync {
    /// Active default permission keys for a role. `Custom` never reaches
    /// storage: it has no implicit defaults by definition.
    async fn defaults_for(&self, role: AccountRole) -> Result<BTreeSet<String>>;
    /// Atomically replace the whole table with the supplied seed. Returns
    /// the number of rows inserted.
    async fn bootstrap(&self, seed: &RoleDefaultSeed) -> Result<u64>;
}

pub struct RoleDefaultsRepositoryImpl {
    pool: MySqlPool,
}

impl RoleDefaultsRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleDefaultsRepository for RoleDefaultsRepositoryImpl {
    async fn defaults_for(&self, role: AccountRole) -> Result<BTreeSet<String>> {
        if !role.has_implicit_defaults() {
            return Ok(BTreeSet::new());
        }

        let keys: Vec<String> = sqlx::query_scalar(
            "SELECT permission_key FROM role_defaults WHERE role = ? AND is_active = TRUE",
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?;

        Ok(keys.into_iter().collect())
    }

    async fn bootstrap(&self, seed: &RoleDefaultSeed) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM role_defaults")
            .execute(&mut *tx)
            .await?;

        let mut inserted = 0u64;
        for (role, keys) in seed {
            for key in keys {
                sqlx::query(
                    r#"
                    INSERT INTO role_defaults (role, permission_key, is_active, created_at)
                    VALUES (?, ?, TRUE, NOW())
                    "#,
                )
                .bind(*role)
                .bind(key)
                .execute(&mut *tx)
                .await?;
                inserted += 1;
            }
        }

        tx.commit().await?;
        Ok(inserted)
    }
}
