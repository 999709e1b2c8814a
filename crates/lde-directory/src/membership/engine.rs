//! Membership mutations and queries.
//!
//! Each mutation runs load -> check -> mutate -> conditional save. A save
//! that lost a race with another writer re-runs the whole cycle against fresh
//! state, so idempotency checks always see the latest list.

use std::sync::Arc;

use lde_config::MembershipConfig;
use tracing::{debug, info};

use super::bulk::{bulk_apply, BulkOutcome};
use super::list::{self, MemberList};
use super::{Mutation, Relation};
use crate::group::Group;
use crate::role::{Role, RoleSnapshot};
use crate::shared::error::{DirectoryError, Result, StorageContext};
use crate::shared::retry::{load_versioned as load, retry_stale, save_versioned as save, Attempt};
use crate::store::{DirectoryStore, EntityKind, ListField, Repository};
use crate::user::User;

pub struct MembershipEngine {
    users: Repository<User>,
    groups: Repository<Group>,
    roles: Repository<Role>,
    conflict_retries: u32,
}

impl MembershipEngine {
    pub fn new(store: Arc<dyn DirectoryStore>, config: &MembershipConfig) -> Self {
        Self {
            users: Repository::new(store.clone()),
            groups: Repository::new(store.clone()),
            roles: Repository::new(store),
            conflict_retries: config.conflict_retries,
        }
    }

    async fn retrying<T, F, Fut>(&self, kind: EntityKind, id: &str, attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<Attempt<T>>>,
    {
        retry_stale(self.conflict_retries, kind, id, attempt).await
    }

    // ========================================================================
    // Generic list mutations
    // ========================================================================

    async fn add_one<E>(&self, repo: &Repository<E>, relation: Relation, owner_id: &str, member_id: &str) -> Result<()>
    where
        E: MemberList<Member = String>,
    {
        self.retrying(E::KIND, owner_id, move || async move {
            let mut owner = load(repo, owner_id).await?;
            if list::contains(owner.entity.members(), member_id) {
                return Err(DirectoryError::already_exists(relation, owner_id, member_id));
            }
            owner.entity.members_mut().push(member_id.to_string());
            save(repo, &owner, relation.save_context(Mutation::AddOne), ()).await
        })
        .await?;

        info!(owner_id = %owner_id, member_id = %member_id, relation = ?relation, "Member added");
        Ok(())
    }

    async fn add_many<E>(&self, repo: &Repository<E>, relation: Relation, owner_id: &str, member_ids: &[String]) -> Result<usize>
    where
        E: MemberList<Member = String>,
    {
        let added = self
            .retrying(E::KIND, owner_id, move || async move {
                let mut owner = load(repo, owner_id).await?;
                let new: Vec<String> = list::missing_keys(owner.entity.members(), member_ids)
                    .into_iter()
                    .map(String::from)
                    .collect();
                if new.is_empty() {
                    return Err(DirectoryError::nothing_to_add(relation, owner_id));
                }
                let added = list::append_new(owner.entity.members_mut(), new);
                save(repo, &owner, relation.save_context(Mutation::AddMany), added).await
            })
            .await?;

        info!(owner_id = %owner_id, added, relation = ?relation, "Members added");
        Ok(added)
    }

    async fn remove_one<E: MemberList>(&self, repo: &Repository<E>, relation: Relation, owner_id: &str, member_id: &str) -> Result<()> {
        self.retrying(E::KIND, owner_id, move || async move {
            let mut owner = load(repo, owner_id).await?;
            if !list::remove_one(owner.entity.members_mut(), member_id) {
                return Err(DirectoryError::not_associated(relation, owner_id, member_id));
            }
            save(repo, &owner, relation.save_context(Mutation::RemoveOne), ()).await
        })
        .await?;

        info!(owner_id = %owner_id, member_id = %member_id, relation = ?relation, "Member removed");
        Ok(())
    }

    async fn remove_many<E: MemberList>(&self, repo: &Repository<E>, relation: Relation, owner_id: &str, member_ids: &[String]) -> Result<usize> {
        let removed = self
            .retrying(E::KIND, owner_id, move || async move {
                let mut owner = load(repo, owner_id).await?;
                let removed = list::remove_all(owner.entity.members_mut(), member_ids);
                if removed == 0 {
                    return Err(DirectoryError::nothing_to_remove(relation, owner_id));
                }
                save(repo, &owner, relation.save_context(Mutation::RemoveMany), removed).await
            })
            .await?;

        info!(owner_id = %owner_id, removed, relation = ?relation, "Members removed");
        Ok(removed)
    }

    async fn members_of<E: MemberList>(&self, repo: &Repository<E>, owner_id: &str) -> Result<Vec<E::Member>> {
        let owner = load(repo, owner_id).await?;
        Ok(owner.entity.members().to_vec())
    }

    // ========================================================================
    // User <-> Group (owned by Group.members)
    // ========================================================================

    pub async fn add_user_to_group(&self, group_id: &str, user_id: &str) -> Result<()> {
        self.add_one(&self.groups, Relation::GroupMembers, group_id, user_id).await
    }

    /// Returns how many users were newly added.
    pub async fn add_users_to_group(&self, group_id: &str, user_ids: &[String]) -> Result<usize> {
        self.add_many(&self.groups, Relation::GroupMembers, group_id, user_ids).await
    }

    pub async fn remove_user_from_group(&self, group_id: &str, user_id: &str) -> Result<()> {
        self.remove_one(&self.groups, Relation::GroupMembers, group_id, user_id).await
    }

    /// Returns how many users were removed.
    pub async fn remove_users_from_group(&self, group_id: &str, user_ids: &[String]) -> Result<usize> {
        self.remove_many(&self.groups, Relation::GroupMembers, group_id, user_ids).await
    }

    pub async fn group_members(&self, group_id: &str) -> Result<Vec<String>> {
        self.members_of(&self.groups, group_id).await
    }

    /// Groups whose member list contains the user, ordered by name.
    ///
    /// The user itself is not required to exist.
    pub async fn groups_for_user(&self, user_id: &str) -> Result<Vec<Group>> {
        let groups = self
            .groups
            .find_where_list_contains(ListField::GroupMembers, user_id)
            .await
            .storage_context("failed to get user groups")?;
        debug!(user_id = %user_id, count = groups.len(), "Resolved groups for user");
        Ok(groups)
    }

    // ========================================================================
    // Group <-> Role (owned by Role.groups)
    // ========================================================================

    pub async fn add_group_to_role(&self, role_id: &str, group_id: &str) -> Result<()> {
        self.add_one(&self.roles, Relation::RoleGroups, role_id, group_id).await
    }

    pub async fn add_groups_to_role(&self, role_id: &str, group_ids: &[String]) -> Result<usize> {
        self.add_many(&self.roles, Relation::RoleGroups, role_id, group_ids).await
    }

    pub async fn remove_group_from_role(&self, role_id: &str, group_id: &str) -> Result<()> {
        self.remove_one(&self.roles, Relation::RoleGroups, role_id, group_id).await
    }

    pub async fn remove_groups_from_role(&self, role_id: &str, group_ids: &[String]) -> Result<usize> {
        self.remove_many(&self.roles, Relation::RoleGroups, role_id, group_ids).await
    }

    pub async fn role_groups(&self, role_id: &str) -> Result<Vec<String>> {
        self.members_of(&self.roles, role_id).await
    }

    /// Roles associated with the group, ordered by name.
    pub async fn roles_for_group(&self, group_id: &str) -> Result<Vec<Role>> {
        self.roles
            .find_where_list_contains(ListField::RoleGroups, group_id)
            .await
            .storage_context("failed to get group roles")
    }

    // ========================================================================
    // User <-> Role (snapshots owned by User.roles)
    // ========================================================================

    /// Copy the current state of the role into the user.
    ///
    /// The role must resolve even when the user already holds a snapshot of it.
    pub async fn assign_role_to_user(&self, user_id: &str, role_id: &str) -> Result<()> {
        let users = &self.users;
        let roles = &self.roles;
        self.retrying(EntityKind::User, user_id, move || async move {
            let mut user = load(users, user_id).await?;
            let role = load(roles, role_id).await?;
            if user.entity.has_role(role_id) {
                return Err(DirectoryError::already_exists(Relation::UserRoles, user_id, role_id));
            }
            user.entity.roles.push(RoleSnapshot::from(&role.entity));
            save(users, &user, Relation::UserRoles.save_context(Mutation::AddOne), ()).await
        })
        .await?;

        info!(user_id = %user_id, role_id = %role_id, "Role assigned to user");
        Ok(())
    }

    /// Assign every requested role the user does not hold yet.
    ///
    /// All new roles are resolved before anything is saved; one unknown role
    /// fails the whole call.
    pub async fn assign_roles_to_user(&self, user_id: &str, role_ids: &[String]) -> Result<usize> {
        let users = &self.users;
        let roles = &self.roles;
        let added = self
            .retrying(EntityKind::User, user_id, move || async move {
                let mut user = load(users, user_id).await?;

                let mut snapshots = Vec::new();
                for role_id in list::missing_keys(&user.entity.roles, role_ids) {
                    let role = load(roles, role_id).await?;
                    snapshots.push(RoleSnapshot::from(&role.entity));
                }
                if snapshots.is_empty() {
                    return Err(DirectoryError::nothing_to_add(Relation::UserRoles, user_id));
                }

                let added = list::append_new(&mut user.entity.roles, snapshots);
                save(users, &user, Relation::UserRoles.save_context(Mutation::AddMany), added).await
            })
            .await?;

        info!(user_id = %user_id, added, "Roles assigned to user");
        Ok(added)
    }

    pub async fn remove_role_from_user(&self, user_id: &str, role_id: &str) -> Result<()> {
        self.remove_one(&self.users, Relation::UserRoles, user_id, role_id).await
    }

    pub async fn remove_roles_from_user(&self, user_id: &str, role_ids: &[String]) -> Result<usize> {
        self.remove_many(&self.users, Relation::UserRoles, user_id, role_ids).await
    }

    pub async fn user_roles(&self, user_id: &str) -> Result<Vec<RoleSnapshot>> {
        self.members_of(&self.users, user_id).await
    }

    /// Users holding a snapshot of the role, ordered by name.
    pub async fn users_with_role(&self, role_id: &str) -> Result<Vec<User>> {
        self.users
            .find_where_list_contains(ListField::UserRoles, role_id)
            .await
            .storage_context("failed to get role users")
    }

    // ========================================================================
    // Bulk coordinator calls
    // ========================================================================

    /// Assign one role to many users. The role must exist before any user is touched.
    pub async fn bulk_assign_role_to_users(&self, role_id: &str, user_ids: &[String]) -> Result<BulkOutcome> {
        let role = load(&self.roles, role_id).await?.entity;
        let message = format!("failed to assign role {} to any users", role.name);

        bulk_apply(user_ids, &message, move |user_id| async move {
            self.assign_role_to_user(&user_id, role_id).await
        })
        .await
    }

    /// Remove one role from many users. The role must exist before any user is touched.
    pub async fn bulk_remove_role_from_users(&self, role_id: &str, user_ids: &[String]) -> Result<BulkOutcome> {
        let role = load(&self.roles, role_id).await?.entity;
        let message = format!("failed to remove role {} from any users", role.name);

        bulk_apply(user_ids, &message, move |user_id| async move {
            self.remove_role_from_user(&user_id, role_id).await
        })
        .await
    }

    /// Add one user to many groups.
    pub async fn bulk_add_user_to_groups(&self, user_id: &str, group_ids: &[String]) -> Result<BulkOutcome> {
        let message = format!("failed to add user {} to any groups", user_id);

        bulk_apply(group_ids, &message, move |group_id| async move {
            self.add_user_to_group(&group_id, user_id).await
        })
        .await
    }

    /// Remove one user from many groups.
    pub async fn bulk_remove_user_from_groups(&self, user_id: &str, group_ids: &[String]) -> Result<BulkOutcome> {
        let message = format!("failed to remove user {} from any groups", user_id);

        bulk_apply(group_ids, &message, move |group_id| async move {
            self.remove_user_from_group(&group_id, user_id).await
        })
        .await
    }
}
