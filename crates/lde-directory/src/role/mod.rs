//! Role Aggregate
//!
//! Roles list the groups they apply to. Users hold copies of roles taken at
//! assignment time.

pub mod api;
pub mod entity;

pub use api::roles_router;
pub use entity::{Role, RoleSnapshot};
