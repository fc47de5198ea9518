//! Business logic layer

pub mod bootstrap;
pub mod grants;
pub mod resolver;

pub use bootstrap::RoleDefaultsService;
pub use grants::{GrantAdminService, MANAGE_PERMISSIONS};
pub use resolver::PermissionResolver;
