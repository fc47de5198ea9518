//! Engine wiring
//!
//! Bundles the concrete repositories and services over one connection pool.
//! Library consumers that want dependency injection construct the services
//! directly; everything else goes through this.

use crate::catalog::PermissionCatalog;
use crate::repository::grant::GrantRepositoryImpl;
use crate::repository::membership::MembershipRepositoryImpl;
use crate::repository::ownership::OwnershipRepositoryImpl;
use crate::repository::role_default::RoleDefaultsRepositoryImpl;
use crate::service::{GrantAdminService, PermissionResolver, RoleDefaultsService};
use sqlx::MySqlPool;
use std::sync::Arc;

type Resolver = PermissionResolver<
    OwnershipRepositoryImpl,
    MembershipRepositoryImpl,
    GrantRepositoryImpl,
    RoleDefaultsRepositoryImpl,
>;

type GrantAdmin = GrantAdminService<
    OwnershipRepositoryImpl,
    MembershipRepositoryImpl,
    GrantRepositoryImpl,
    RoleDefaultsRepositoryImpl,
>;

pub struct AuthzEngine {
    catalog: Arc<PermissionCatalog>,
    resolver: Arc<Resolver>,
    grants: GrantAdmin,
    role_defaults: RoleDefaultsService<RoleDefaultsRepositoryImpl>,
}

impl AuthzEngine {
    pub fn new(pool: MySqlPool, catalog: PermissionCatalog) -> Self {
        let catalog = Arc::new(catalog);
        let ownerships = Arc::new(OwnershipRepositoryImpl::new(pool.clone()));
        let memberships = Arc::new(MembershipRepositoryImpl::new(pool.clone()));
        let grants_repo = Arc::new(GrantRepositoryImpl::new(pool.clone()));
        let role_defaults_repo = Arc::new(RoleDefaultsRepositoryImpl::new(pool));

        let resolver = Arc::new(PermissionResolver::new(
            ownerships.clone(),
            memberships.clone(),
            grants_repo.clone(),
            role_defaults_repo.clone(),
            catalog.clone(),
        ));
        let grants = GrantAdminService::new(
            ownerships,
            grants_repo,
            catalog.clone(),
            resolver.clone(),
        );
        let role_defaults = RoleDefaultsService::new(role_defaults_repo, catalog.clone());

        Self {
            catalog,
            resolver,
            grants,
            role_defaults,
        }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn grants(&self) -> &GrantAdmin {
        &self.grants
    }

    pub fn role_defaults(&self) -> &RoleDefaultsService<RoleDefaultsRepositoryImpl> {
        &self.role_defaults
    }

    pub fn catalog(&self) -> &PermissionCatalog {
        &self.catalog
    }
}
