//! Grant administration
//!
//! The caller-visible mutation surface over the grant store. The system is
//! self-hosting: every mutation is gated by a `manage_permissions` check
//! through the resolver itself (owners pass via the ownership bypass).
//! Validation failures leave the stored grant set untouched.

use crate::catalog::PermissionCatalog;
use crate::domain::{Grant, GrantInput, ReplaceGrantsInput, StringUuid};
use crate::error::{AppError, Result};
use crate::repository::{
    GrantRepository, MembershipRepository, OwnershipRepository, RoleDefaultsRepository,
};
use crate::service::PermissionResolver;
use std::collections::BTreeSet;
use std::sync::Arc;
use validator::Validate;

/// The permission that gates every grant mutation.
pub const MANAGE_PERMISSIONS: &str = "manage_permissions";

pub struct GrantAdminService<O, M, G, R> {
    ownerships: Arc<O>,
    grants: Arc<G>,
    catalog: Arc<PermissionCatalog>,
    resolver: Arc<PermissionResolver<O, M, G, R>>,
}

impl<O, M, G, R> GrantAdminService<O, M, G, R>
where
    O: OwnershipRepository,
    M: MembershipRepository,
    G: GrantRepository,
    R: RoleDefaultsRepository,
{
    pub fn new(
        ownerships: Arc<O>,
        grants: Arc<G>,
        catalog: Arc<PermissionCatalog>,
        resolver: Arc<PermissionResolver<O, M, G, R>>,
    ) -> Self {
        Self {
            ownerships,
            grants,
            catalog,
            resolver,
        }
    }

    /// Transactional full replacement of a user's grant set. Rejected
    /// outright, with no partial effect, when a key is unknown to the
    /// catalog or the target is an active account owner.
    pub async fn replace_all(&self, input: ReplaceGrantsInput) -> Result<()> {
        input.validate()?;
        for key in &input.permission_keys {
            self.ensure_known_key(key)?;
        }

        let user_id = StringUuid::from(input.user_id);
        let account_id = StringUuid::from(input.account_id);
        let granted_by = StringUuid::from(input.granted_by);

        self.ensure_actor_may_manage(granted_by, account_id).await?;

        if self.ownerships.is_owner(user_id, account_id).await? {
            return Err(AppError::Validation(
                "Account owners hold every permission; individual grants cannot target an owner"
                    .to_string(),
            ));
        }

        let keys: BTreeSet<String> = input.permission_keys.iter().cloned().collect();
        self.grants
            .replace_all(
                user_id,
                account_id,
                &keys,
                granted_by,
                input.notes.clone(),
            )
            .await?;

        tracing::info!(
            user_id = %user_id,
            account_id = %account_id,
            granted_by = %granted_by,
            count = keys.len(),
            "replaced grant set"
        );
        Ok(())
    }

    /// Grant a single permission (upsert on re-grant).
    pub async fn grant(&self, input: GrantInput) -> Result<Grant> {
        input.validate()?;
        self.ensure_known_key(&input.permission_key)?;

        let account_id = StringUuid::from(input.account_id);
        let granted_by = StringUuid::from(input.granted_by);
        self.ensure_actor_may_manage(granted_by, account_id).await?;

        let grant = self.grants.upsert(&input).await?;
        tracing::info!(
            user_id = %grant.user_id,
            account_id = %grant.account_id,
            permission_key = %grant.permission_key,
            granted_by = %granted_by,
            "granted permission"
        );
        Ok(grant)
    }

    /// Revoke one grant. The row stays behind, deactivated; resolution
    /// falls back to whatever the member's role grants by default.
    pub async fn revoke(
        &self,
        user_id: StringUuid,
        account_id: StringUuid,
        permission_key: &str,
        revoked_by: StringUuid,
    ) -> Result<()> {
        self.ensure_actor_may_manage(revoked_by, account_id).await?;

        if !self
            .grants
            .revoke(user_id, account_id, permission_key)
            .await?
        {
            return Err(AppError::NotFound(format!(
                "No grant of {permission_key} for user {user_id} in account {account_id}"
            )));
        }

        tracing::info!(
            user_id = %user_id,
            account_id = %account_id,
            permission_key,
            revoked_by = %revoked_by,
            "revoked permission"
        );
        Ok(())
    }

    /// All grant rows for a pair, revoked and expired ones included. What a
    /// permission-management UI renders next to the effective set.
    pub async fn list(&self, user_id: StringUuid, account_id: StringUuid) -> Result<Vec<Grant>> {
        self.grants.list(user_id, account_id).await
    }

    fn ensure_known_key(&self, key: &str) -> Result<()> {
        if self.catalog.contains(key) {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "Unknown permission key: {key}"
            )))
        }
    }

    async fn ensure_actor_may_manage(
        &self,
        actor: StringUuid,
        account_id: StringUuid,
    ) -> Result<()> {
        if self
            .resolver
            .has_permission(actor, Some(account_id), MANAGE_PERMISSIONS)
            .await?
        {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Permission denied. Required permission: {MANAGE_PERMISSIONS}"
            )))
        }
    }
}
