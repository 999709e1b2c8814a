//! User Entity

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::membership::list::first_duplicate;
use crate::role::RoleSnapshot;
use crate::store::{Entity, EntityKind};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Unique user identifier
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub email: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Role snapshots, at most one per role ID
    #[serde(default)]
    pub roles: Vec<RoleSnapshot>,

    /// Caller-managed group references. Membership itself lives on the group.
    #[serde(default)]
    pub group_ids: Vec<String>,
}

impl User {
    pub fn new(id: impl Into<String>, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn has_role(&self, role_id: &str) -> bool {
        self.roles.iter().any(|r| r.id == role_id)
    }

    pub fn role_ids(&self) -> Vec<&str> {
        self.roles.iter().map(|r| r.id.as_str()).collect()
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), String> {
        if let Some(dup) = first_duplicate(&self.roles) {
            return Err(format!("user {} holds role {} more than once", self.id, dup));
        }
        if let Some(dup) = first_duplicate(&self.group_ids) {
            return Err(format!("user {} lists group {} more than once", self.id, dup));
        }
        Ok(())
    }
}
