//! Grant store integration tests
//!
//! Upsert semantics, audit-preserving revocation, transactional full
//! replacement and the owner-target rejection.

use chrono::{Duration, Utc};
use clinio_authz::catalog::PermissionCatalog;
use clinio_authz::domain::{AccountRole, GrantInput, ReplaceGrantsInput, StringUuid};
use clinio_authz::repository::grant::GrantRepositoryImpl;
use clinio_authz::repository::membership::MembershipRepositoryImpl;
use clinio_authz::repository::ownership::OwnershipRepositoryImpl;
use clinio_authz::repository::{GrantRepository, MembershipRepository, OwnershipRepository};
use clinio_authz::{AppError, AuthzEngine};
use std::collections::BTreeSet;

mod common;

fn keys(keys: &[&str]) -> BTreeSet<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

fn grant_input(user: StringUuid, account: StringUuid, key: &str) -> GrantInput {
    GrantInput {
        user_id: *user,
        account_id: *account,
        permission_key: key.to_string(),
        granted_by: *StringUuid::new_v4(),
        expires_at: None,
        notes: None,
    }
}

#[tokio::test]
async fn test_regrant_updates_the_existing_row() {
    let pool = match common::get_test_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: could not connect to database: {}", e);
            return;
        }
    };
    common::setup_database(&pool).await.unwrap();

    let user = StringUuid::new_v4();
    let account = StringUuid::new_v4();
    let grants = GrantRepositoryImpl::new(pool.clone());

    let first = grants
        .upsert(&grant_input(user, account, "view_billing"))
        .await
        .unwrap();

    let mut regrant = grant_input(user, account, "view_billing");
    regrant.notes = Some("extended for audit season".to_string());
    regrant.expires_at = Some(Utc::now() + Duration::days(30));
    let second = grants.upsert(&regrant).await.unwrap();

    // Same row, refreshed fields.
    assert_eq!(first.id, second.id);
    assert_eq!(second.notes.as_deref(), Some("extended for audit season"));
    assert!(second.expires_at.is_some());
    assert_eq!(grants.list(user, account).await.unwrap().len(), 1);

    common::cleanup_account(&pool, account).await.unwrap();
}

#[tokio::test]
async fn test_revoke_keeps_the_row_for_audit() {
    let pool = match common::get_test_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: could not connect to database: {}", e);
            return;
        }
    };
    common::setup_database(&pool).await.unwrap();

    let user = StringUuid::new_v4();
    let account = StringUuid::new_v4();
    let grants = GrantRepositoryImpl::new(pool.clone());

    grants
        .upsert(&grant_input(user, account, "manage_billing"))
        .await
        .unwrap();
    assert!(grants.revoke(user, account, "manage_billing").await.unwrap());

    assert!(grants.active_keys(user, account).await.unwrap().is_empty());
    let rows = grants.list(user, account).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].is_active);

    // Revoking a key that was never granted reports false.
    assert!(!grants.revoke(user, account, "view_team").await.unwrap());

    common::cleanup_account(&pool, account).await.unwrap();
}

#[tokio::test]
async fn test_replace_all_swaps_the_whole_set() {
    let pool = match common::get_test_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: could not connect to database: {}", e);
            return;
        }
    };
    common::setup_database(&pool).await.unwrap();

    let user = StringUuid::new_v4();
    let account = StringUuid::new_v4();
    let admin = StringUuid::new_v4();
    let grants = GrantRepositoryImpl::new(pool.clone());

    grants
        .upsert(&grant_input(user, account, "view_billing"))
        .await
        .unwrap();
    grants
        .upsert(&grant_input(user, account, "view_reports"))
        .await
        .unwrap();

    grants
        .replace_all(
            user,
            account,
            &keys(&["view_reports", "export_reports"]),
            admin,
            None,
        )
        .await
        .unwrap();

    // Old set fully gone, new set fully present, nothing in between left.
    assert_eq!(
        grants.active_keys(user, account).await.unwrap(),
        keys(&["view_reports", "export_reports"])
    );
    assert_eq!(grants.list(user, account).await.unwrap().len(), 2);

    // The empty set clears everything.
    grants
        .replace_all(user, account, &BTreeSet::new(), admin, None)
        .await
        .unwrap();
    assert!(grants.list(user, account).await.unwrap().is_empty());

    common::cleanup_account(&pool, account).await.unwrap();
}

#[tokio::test]
async fn test_expired_grants_are_listed_but_not_active() {
    let pool = match common::get_test_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: could not connect to database: {}", e);
            return;
        }
    };
    common::setup_database(&pool).await.unwrap();

    let user = StringUuid::new_v4();
    let account = StringUuid::new_v4();
    let grants = GrantRepositoryImpl::new(pool.clone());

    let mut expired = grant_input(user, account, "manage_pricing");
    expired.expires_at = Some(Utc::now() - Duration::hours(1));
    grants.upsert(&expired).await.unwrap();

    let mut live = grant_input(user, account, "view_billing");
    live.expires_at = Some(Utc::now() + Duration::hours(1));
    grants.upsert(&live).await.unwrap();

    assert_eq!(
        grants.active_keys(user, account).await.unwrap(),
        keys(&["view_billing"])
    );
    // Both rows remain visible to the audit listing.
    assert_eq!(grants.list(user, account).await.unwrap().len(), 2);

    common::cleanup_account(&pool, account).await.unwrap();
}

#[tokio::test]
async fn test_scenario_d_replace_all_rejects_owner_target() {
    let pool = match common::get_test_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: could not connect to database: {}", e);
            return;
        }
    };
    common::setup_database(&pool).await.unwrap();
    common::seed_role_defaults(&pool).await;

    let owner = StringUuid::new_v4();
    let account = StringUuid::new_v4();
    OwnershipRepositoryImpl::new(pool.clone())
        .create(owner, account)
        .await
        .unwrap();

    let engine = AuthzEngine::new(pool.clone(), PermissionCatalog::builtin());
    let result = engine
        .grants()
        .replace_all(ReplaceGrantsInput {
            user_id: *owner,
            account_id: *account,
            permission_keys: vec!["view_patients_list".to_string()],
            granted_by: *owner,
            notes: None,
        })
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    // No grant rows appeared for the owner.
    assert!(engine.grants().list(owner, account).await.unwrap().is_empty());

    common::cleanup_account(&pool, account).await.unwrap();
}

#[tokio::test]
async fn test_replace_all_by_unprivileged_member_is_forbidden() {
    let pool = match common::get_test_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: could not connect to database: {}", e);
            return;
        }
    };
    common::setup_database(&pool).await.unwrap();
    common::seed_role_defaults(&pool).await;

    let target = StringUuid::new_v4();
    let actor = StringUuid::new_v4();
    let account = StringUuid::new_v4();
    MembershipRepositoryImpl::new(pool.clone())
        .create(actor, account, AccountRole::Assistant)
        .await
        .unwrap();

    let engine = AuthzEngine::new(pool.clone(), PermissionCatalog::builtin());
    let result = engine
        .grants()
        .replace_all(ReplaceGrantsInput {
            user_id: *target,
            account_id: *account,
            permission_keys: vec!["view_billing".to_string()],
            granted_by: *actor,
            notes: None,
        })
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));

    common::cleanup_account(&pool, account).await.unwrap();
}

#[tokio::test]
async fn test_member_with_manage_permissions_grant_can_mutate() {
    let pool = match common::get_test_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: could not connect to database: {}", e);
            return;
        }
    };
    common::setup_database(&pool).await.unwrap();
    common::seed_role_defaults(&pool).await;

    let target = StringUuid::new_v4();
    let actor = StringUuid::new_v4();
    let account = StringUuid::new_v4();

    let memberships = MembershipRepositoryImpl::new(pool.clone());
    memberships
        .create(actor, account, AccountRole::Administrator)
        .await
        .unwrap();
    memberships
        .create(target, account, AccountRole::ReadOnly)
        .await
        .unwrap();

    // The system is self-hosting: manage_permissions itself arrives as an
    // individual grant.
    GrantRepositoryImpl::new(pool.clone())
        .upsert(&grant_input(actor, account, "manage_permissions"))
        .await
        .unwrap();

    let engine = AuthzEngine::new(pool.clone(), PermissionCatalog::builtin());
    engine
        .grants()
        .replace_all(ReplaceGrantsInput {
            user_id: *target,
            account_id: *account,
            permission_keys: vec!["view_billing".to_string()],
            granted_by: *actor,
            notes: None,
        })
        .await
        .unwrap();

    assert!(engine
        .resolver()
        .has_permission(target, Some(account), "view_billing")
        .await
        .unwrap());

    common::cleanup_account(&pool, account).await.unwrap();
}

#[tokio::test]
async fn test_membership_reprovision_updates_role_in_place() {
    let pool = match common::get_test_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: could not connect to database: {}", e);
            return;
        }
    };
    common::setup_database(&pool).await.unwrap();

    let user = StringUuid::new_v4();
    let account = StringUuid::new_v4();
    let memberships = MembershipRepositoryImpl::new(pool.clone());

    memberships
        .create(user, account, AccountRole::Doctor)
        .await
        .unwrap();
    let updated = memberships
        .create(user, account, AccountRole::Assistant)
        .await
        .unwrap();

    assert_eq!(updated.role, AccountRole::Assistant);
    assert_eq!(
        memberships.role_of(user, account).await.unwrap(),
        Some(AccountRole::Assistant)
    );

    memberships.deactivate(user, account).await.unwrap();
    assert_eq!(memberships.role_of(user, account).await.unwrap(), None);
    // Row survives deactivation.
    assert!(memberships.find(user, account).await.unwrap().is_some());

    common::cleanup_account(&pool, account).await.unwrap();
}
