//! Data access layer (Repository pattern)

pub mod grant;
pub mod membership;
pub mod ownership;
pub mod role_default;

pub use grant::GrantRepository;
pub use membership::MembershipRepository;
pub use ownership::OwnershipRepository;
pub use role_default::RoleDefaultsRepository;
