//! Account roles
//!
//! The closed set of operational roles a member can hold in an account.
//! Roles are persisted as the historical three-letter codes, so the enum
//! carries explicit renames instead of deriving them from variant names.

use serde::{Deserialize, Serialize};

/// Operational role of a member within an account.
///
/// `Custom` carries no implicit permissions: everything a custom member can
/// do must come from individual grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
pub enum AccountRole {
    #[serde(rename = "adm")]
    #[sqlx(rename = "adm")]
    Administrator,
    #[serde(rename = "doc")]
    #[sqlx(rename = "doc")]
    Doctor,
    #[serde(rename = "ast")]
    #[sqlx(rename = "ast")]
    Assistant,
    #[serde(rename = "rdo")]
    #[sqlx(rename = "rdo")]
    ReadOnly,
    #[serde(rename = "cus")]
    #[sqlx(rename = "cus")]
    Custom,
}

impl AccountRole {
    pub const ALL: [AccountRole; 5] = [
        AccountRole::Administrator,
        AccountRole::Doctor,
        AccountRole::Assistant,
        AccountRole::ReadOnly,
        AccountRole::Custom,
    ];

    /// Stable storage/wire code.
    pub fn code(&self) -> &'static str {
        match self {
            AccountRole::Administrator => "adm",
            AccountRole::Doctor => "doc",
            AccountRole::Assistant => "ast",
            AccountRole::ReadOnly => "rdo",
            AccountRole::Custom => "cus",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "adm" => Some(AccountRole::Administrator),
            "doc" => Some(AccountRole::Doctor),
            "ast" => Some(AccountRole::Assistant),
            "rdo" => Some(AccountRole::ReadOnly),
            "cus" => Some(AccountRole::Custom),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AccountRole::Administrator => "Administrator",
            AccountRole::Doctor => "Doctor",
            AccountRole::Assistant => "Assistant",
            AccountRole::ReadOnly => "Read Only",
            AccountRole::Custom => "Custom",
        }
    }

    /// Badge color used by frontends when rendering the role.
    pub fn badge_color(&self) -> &'static str {
        match self {
            AccountRole::Administrator => "#dc3545",
            AccountRole::Doctor => "#0d6efd",
            AccountRole::Assistant => "#0dcaf0",
            AccountRole::ReadOnly => "#6c757d",
            AccountRole::Custom => "#ffc107",
        }
    }

    /// Whether this role receives default permissions from the role-default
    /// table. `Custom` is the one role that never does.
    pub fn has_implicit_defaults(&self) -> bool {
        !matches!(self, AccountRole::Custom)
    }
}

impl std::fmt::Display for AccountRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
