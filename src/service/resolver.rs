//! Permission resolution
//!
//! The decision algorithm of the authorization core. For a
//! `(user, account, permission-key)` triple the resolver merges three
//! sources of truth with strict precedence:
//!
//! 1. Ownership: an active owner is allowed everything, unconditionally.
//! 2. Membership gate: without an active membership (and without
//!    ownership) everything is denied; grants are never even consulted.
//! 3. Individual grants: an active, unexpired grant allows the key.
//! 4. Role defaults: otherwise the member's role decides.
//!
//! Denial is the normal outcome, answered as `Ok(false)`; the resolver only
//! errors on storage failures. Every call reads the latest committed state;
//! there is no cache in this layer.

use crate::catalog::PermissionCatalog;
use crate::domain::{EffectivePermissions, StringUuid, TenantContext};
use crate::error::{AppError, Result};
use crate::repository::{
    GrantRepository, MembershipRepository, OwnershipRepository, RoleDefaultsRepository,
};
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct PermissionResolver<O, M, G, R> {
    ownerships: Arc<O>,
    memberships: Arc<M>,
    grants: Arc<G>,
    role_defaults: Arc<R>,
    catalog: Arc<PermissionCatalog>,
}

impl<O, M, G, R> PermissionResolver<O, M, G, R>
where
    O: OwnershipRepository,
    M: MembershipRepository,
    G: GrantRepository,
    R: RoleDefaultsRepository,
{
    pub fn new(
        ownerships: Arc<O>,
        memberships: Arc<M>,
        grants: Arc<G>,
        role_defaults: Arc<R>,
        catalog: Arc<PermissionCatalog>,
    ) -> Self {
        Self {
            ownerships,
            memberships,
            grants,
            role_defaults,
            catalog,
        }
    }

    /// Decide whether `user_id` may exercise `permission_key` in the
    /// account. An unresolved account is an unconditional deny, never an
    /// error. Unknown keys simply never match anything (owners excepted:
    /// ownership is checked before the key is ever looked at).
    pub async fn has_permission(
        &self,
        user_id: StringUuid,
        account_id: Option<StringUuid>,
        permission_key: &str,
    ) -> Result<bool> {
        let Some(account_id) = account_id else {
            return Ok(false);
        };

        if self.ownerships.is_owner(user_id, account_id).await? {
            return Ok(true);
        }

        let Some(role) = self.memberships.role_of(user_id, account_id).await? else {
            return Ok(false);
        };

        if self
            .grants
            .active_keys(user_id, account_id)
            .await?
            .contains(permission_key)
        {
            return Ok(true);
        }

        Ok(self
            .role_defaults
            .defaults_for(role)
            .await?
            .contains(permission_key))
    }

    /// `Ok(())` when allowed, `AppError::Forbidden` otherwise. The hook
    /// domain controllers call before serving a request.
    pub async fn require_permission(
        &self,
        user_id: StringUuid,
        account_id: Option<StringUuid>,
        permission_key: &str,
    ) -> Result<()> {
        if self
            .has_permission(user_id, account_id, permission_key)
            .await?
        {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Permission denied. Required permission: {permission_key}"
            )))
        }
    }

    /// Resolve the full permission set with provenance. Owners resolve to
    /// the whole catalog as role-derived; the `role` field still reports
    /// their membership role when they hold one.
    pub async fn effective_permissions(
        &self,
        user_id: StringUuid,
        account_id: Option<StringUuid>,
    ) -> Result<EffectivePermissions> {
        let Some(account_id) = account_id else {
            return Ok(EffectivePermissions::denied());
        };

        if self.ownerships.is_owner(user_id, account_id).await? {
            let role = self.memberships.role_of(user_id, account_id).await?;
            return Ok(EffectivePermissions {
                role,
                is_owner: true,
                role_derived: self.catalog.keys(),
                individually_granted: BTreeSet::new(),
            });
        }

        let Some(role) = self.memberships.role_of(user_id, account_id).await? else {
            return Ok(EffectivePermissions::denied());
        };

        let role_derived = self.role_defaults.defaults_for(role).await?;
        let individually_granted = self.grants.active_keys(user_id, account_id).await?;

        Ok(EffectivePermissions {
            role: Some(role),
            is_owner: false,
            role_derived,
            individually_granted,
        })
    }

    pub async fn has_permission_ctx(
        &self,
        ctx: &TenantContext,
        permission_key: &str,
    ) -> Result<bool> {
        self.has_permission(ctx.user_id, ctx.account_id, permission_key)
            .await
    }

    pub async fn require_permission_ctx(
        &self,
        ctx: &TenantContext,
        permission_key: &str,
    ) -> Result<()> {
        self.require_permission(ctx.user_id, ctx.account_id, permission_key)
            .await
    }

    pub async fn effective_permissions_ctx(
        &self,
        ctx: &TenantContext,
    ) -> Result<EffectivePermissions> {
        self.effective_permissions(ctx.user_id, ctx.account_id)
            .await
    }
}
