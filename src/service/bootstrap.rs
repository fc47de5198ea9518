//! Role-default bootstrap
//!
//! Seeds the role-default table from configuration, normally once per
//! deployment or version. The seed is validated against the catalog before
//! anything touches storage; the repository then swaps the whole table in
//! one transaction.

use crate::catalog::{PermissionCatalog, RoleDefaultSeed};
use crate::domain::AccountRole;
use crate::error::{AppError, Result};
use crate::repository::RoleDefaultsRepository;
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct RoleDefaultsService<R> {
    repo: Arc<R>,
    catalog: Arc<PermissionCatalog>,
}

impl<R: RoleDefaultsRepository> RoleDefaultsService<R> {
    pub fn new(repo: Arc<R>, catalog: Arc<PermissionCatalog>) -> Self {
        Self { repo, catalog }
    }

    /// Replace the role-default table with `seed`. Idempotent: running the
    /// same seed twice leaves the same table behind.
    pub async fn bootstrap(&self, seed: &RoleDefaultSeed) -> Result<u64> {
        if seed.contains_key(&AccountRole::Custom) {
            return Err(AppError::Validation(
                "The custom role has no implicit permissions and must not be seeded".to_string(),
            ));
        }
        for (role, keys) in seed {
            for key in keys {
                if !self.catalog.contains(key) {
                    return Err(AppError::Validation(format!(
                        "Unknown permission key {key} in defaults for role {role}"
                    )));
                }
            }
        }

        let inserted = self.repo.bootstrap(seed).await?;
        tracing::info!(inserted, "seeded role default permissions");
        Ok(inserted)
    }

    pub async fn defaults_for(&self, role: AccountRole) -> Result<BTreeSet<String>> {
        self.repo.defaults_for(role).await
    }
}
