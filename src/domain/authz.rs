//! Authorization domain models
//!
//! The four persisted record types the resolver consumes (ownership,
//! membership, role defaults, individual grants) plus the effective
//! permission set returned to permission-management UIs.

use super::common::StringUuid;
use super::role::AccountRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeSet;
use uuid::Uuid;
use validator::Validate;

/// Account ownership record. An active row bypasses every other check.
///
/// Rows are deactivated on ownership transfer, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ownership {
    pub id: u64,
    pub user_id: StringUuid,
    pub account_id: StringUuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Role-bearing membership of a user in an account. One role per
/// `(user, account)` pair.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Membership {
    pub id: u64,
    pub user_id: StringUuid,
    pub account_id: StringUuid,
    pub role: AccountRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A permission every active member holding `role` receives by default.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoleDefault {
    pub id: u64,
    pub role: AccountRole,
    pub permission_key: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Individually-granted, possibly time-bounded authorization. Overrides
/// role defaults for one `(user, account, permission_key)` triple.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Grant {
    pub id: u64,
    pub user_id: StringUuid,
    pub account_id: StringUuid,
    pub permission_key: String,
    pub granted_by: StringUuid,
    pub is_active: bool,
    pub granted_at: DateTime<Utc>,
    /// `None` means the grant is permanent.
    pub expires_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl Grant {
    /// Expiry is computed against the wall clock; there is no stored
    /// "expired" status to transition.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            None => false,
            Some(expires_at) => Utc::now() > expires_at,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_active && !self.is_expired()
    }
}

/// Resolved permission set for a user in an account, with provenance.
///
/// The breakdown is kept separate from the union because management UIs
/// answer "why does this user have X" from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermissions {
    pub role: Option<AccountRole>,
    pub is_owner: bool,
    pub role_derived: BTreeSet<String>,
    pub individually_granted: BTreeSet<String>,
}

impl EffectivePermissions {
    /// The empty result: unresolved tenant, or neither member nor owner.
    pub fn denied() -> Self {
        Self {
            role: None,
            is_owner: false,
            role_derived: BTreeSet::new(),
            individually_granted: BTreeSet::new(),
        }
    }

    /// Union of both sources; the set the user can actually exercise.
    pub fn union(&self) -> BTreeSet<String> {
        self.role_derived
            .union(&self.individually_granted)
            .cloned()
            .collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.role_derived.contains(key) || self.individually_granted.contains(key)
    }
}

/// Input for granting a single permission to a user in an account.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GrantInput {
    pub user_id: Uuid,
    pub account_id: Uuid,
    #[validate(
        length(min = 1, max = 50),
        custom(function = "validate_permission_key")
    )]
    pub permission_key: String,
    pub granted_by: Uuid,
    pub expires_at: Option<DateTime<Utc>>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Input for the transactional full replacement of a user's grant set.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReplaceGrantsInput {
    pub user_id: Uuid,
    pub account_id: Uuid,
    #[validate(custom(function = "validate_permission_keys"))]
    pub permission_keys: Vec<String>,
    pub granted_by: Uuid,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Validate permission key format (e.g., "view_patients_list")
fn validate_permission_key(key: &str) -> Result<(), validator::ValidationError> {
    if PERMISSION_KEY_REGEX.is_match(key) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_permission_key"))
    }
}

fn validate_permission_keys(keys: &[String]) -> Result<(), validator::ValidationError> {
    for key in keys {
        validate_permission_key(key)?;
    }
    Ok(())
}

// Regex for permission key validation
lazy_static::lazy_static! {
    pub static ref PERMISSION_KEY_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-z][a-z0-9]*(?:_[a-z0-9]+)*$").unwrap();
}
