//! Domain models for the authorization core

pub mod authz;
pub mod common;
pub mod context;
pub mod role;

pub use authz::{
    EffectivePermissions, Grant, GrantInput, Membership, Ownership, ReplaceGrantsInput,
    RoleDefault, PERMISSION_KEY_REGEX,
};
pub use common::StringUuid;
pub use context::TenantContext;
pub use role::AccountRole;
