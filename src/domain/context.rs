//! Request-scoped tenant context
//!
//! Tenant resolution happens once, at the edge (middleware maps the opaque
//! account header plus the authenticated caller into a validated pair, or
//! into `None` when the account is unknown or the caller has no access).
//! Everything downstream carries this context instead of re-deriving it.

use super::common::StringUuid;
use serde::{Deserialize, Serialize};

/// The `(user, account)` pair a request acts under.
///
/// `account_id` is `None` when tenant resolution failed; the resolver
/// treats that as an unconditional deny, never as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    pub user_id: StringUuid,
    pub account_id: Option<StringUuid>,
}

impl TenantContext {
    pub fn new(user_id: StringUuid, account_id: StringUuid) -> Self {
        Self {
            user_id,
            account_id: Some(account_id),
        }
    }

    /// A context whose tenant could not be resolved.
    pub fn unresolved(user_id: StringUuid) -> Self {
        Self {
            user_id,
            account_id: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.account_id.is_some()
    }
}
