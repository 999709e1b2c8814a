//! User Aggregate
//!
//! Users carry the groups they belong to and a snapshot of each assigned role.

pub mod api;
pub mod entity;

pub use api::users_router;
pub use entity::User;
