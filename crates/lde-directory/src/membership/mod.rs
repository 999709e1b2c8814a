//! Membership Engine
//!
//! Many-to-many relationships stored as ID lists embedded in the owning
//! entity: `Group.members`, `Role.groups` and `User.roles`. Every mutation
//! loads the owner, checks, mutates the list and saves the whole entity.

pub mod bulk;
pub mod engine;
pub mod list;

pub use bulk::{bulk_apply, BulkItemFailure, BulkOutcome};
pub use engine::MembershipEngine;

/// The three owner/member relationships.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Users listed in `Group.members`
    GroupMembers,
    /// Groups listed in `Role.groups`
    RoleGroups,
    /// Role snapshots held in `User.roles`
    UserRoles,
}

/// Which kind of list mutation failed to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    AddOne,
    AddMany,
    RemoveOne,
    RemoveMany,
}

impl Relation {
    pub fn already_exists_message(&self, owner_id: &str, member_id: &str) -> String {
        match self {
            Relation::GroupMembers => format!("user {} is already a member of group {}", member_id, owner_id),
            Relation::RoleGroups => format!("group {} is already associated with role {}", member_id, owner_id),
            Relation::UserRoles => format!("user {} already has role {}", owner_id, member_id),
        }
    }

    pub fn not_associated_message(&self, owner_id: &str, member_id: &str) -> String {
        match self {
            Relation::GroupMembers => format!("user {} is not a member of group {}", member_id, owner_id),
            Relation::RoleGroups => format!("group {} is not associated with role {}", member_id, owner_id),
            Relation::UserRoles => format!("user {} does not have role {}", owner_id, member_id),
        }
    }

    pub fn nothing_to_add(&self) -> &'static str {
        match self {
            Relation::GroupMembers => "all specified users are already members of the group",
            Relation::RoleGroups => "all specified groups are already associated with the role",
            Relation::UserRoles => "user already has all specified roles",
        }
    }

    pub fn nothing_to_remove(&self) -> &'static str {
        match self {
            Relation::GroupMembers => "none of the specified users are members of the group",
            Relation::RoleGroups => "none of the specified groups are associated with the role",
            Relation::UserRoles => "user does not have any of the specified roles",
        }
    }

    pub fn save_context(&self, mutation: Mutation) -> &'static str {
        use Mutation::*;
        match (self, mutation) {
            (Relation::GroupMembers, AddOne) => "failed to add user to group",
            (Relation::GroupMembers, AddMany) => "failed to add users to group",
            (Relation::GroupMembers, RemoveOne) => "failed to remove user from group",
            (Relation::GroupMembers, RemoveMany) => "failed to remove users from group",
            (Relation::RoleGroups, AddOne) => "failed to add group to role",
            (Relation::RoleGroups, AddMany) => "failed to add groups to role",
            (Relation::RoleGroups, RemoveOne) => "failed to remove group from role",
            (Relation::RoleGroups, RemoveMany) => "failed to remove groups from role",
            (Relation::UserRoles, AddOne) => "failed to assign role to user",
            (Relation::UserRoles, AddMany) => "failed to assign roles to user",
            (Relation::UserRoles, RemoveOne) => "failed to remove role from user",
            (Relation::UserRoles, RemoveMany) => "failed to remove roles from user",
        }
    }
}
