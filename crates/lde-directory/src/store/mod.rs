//! Entity Store
//!
//! Persistence for users, groups and roles. Records are JSON documents, one
//! table per [`EntityKind`], each carrying a store-managed version used for
//! optimistic concurrency.

pub mod memory;
pub mod postgres;
pub mod repository;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repository::{Entity, Repository, Versioned};

/// Version assigned to a freshly inserted record.
pub const INITIAL_VERSION: i64 = 1;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{kind} with id {id} already exists")]
    Duplicate { kind: EntityKind, id: String },

    #[error("Configuration error: {0}")]
    Config(#[from] lde_config::ConfigError),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// The three stored entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Group,
    Role,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::User, EntityKind::Group, EntityKind::Role];

    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Group => "groups",
            EntityKind::Role => "roles",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Group => "group",
            EntityKind::Role => "role",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Embedded ID lists that can be searched for containment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListField {
    /// `Group.members`
    GroupMembers,
    /// `Role.groups`
    RoleGroups,
    /// `User.group_ids`
    UserGroupIds,
    /// `User.roles`, matched on the snapshot's `id`
    UserRoles,
}

impl ListField {
    pub fn kind(&self) -> EntityKind {
        match self {
            ListField::GroupMembers => EntityKind::Group,
            ListField::RoleGroups => EntityKind::Role,
            ListField::UserGroupIds | ListField::UserRoles => EntityKind::User,
        }
    }

    /// JSON key of the list inside the document.
    pub fn key(&self) -> &'static str {
        match self {
            ListField::GroupMembers => "members",
            ListField::RoleGroups => "groups",
            ListField::UserGroupIds => "group_ids",
            ListField::UserRoles => "roles",
        }
    }

    /// Whether the list holds objects keyed by `id` rather than plain strings.
    pub fn holds_snapshots(&self) -> bool {
        matches!(self, ListField::UserRoles)
    }

    /// True when the document's list contains `value`.
    pub fn contained_in(&self, body: &Value, value: &str) -> bool {
        let Some(items) = body.get(self.key()).and_then(Value::as_array) else {
            return false;
        };
        items.iter().any(|item| {
            let id = if self.holds_snapshots() { item.get("id") } else { Some(item) };
            id.and_then(Value::as_str) == Some(value)
        })
    }
}

/// Sort order for listings. Ties are broken by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKey {
    Name,
    Id,
}

/// A stored record: the entity's JSON plus its store-managed version.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub kind: EntityKind,
    pub id: String,
    pub name: String,
    pub version: i64,
    pub body: Value,
}

/// Storage backend for directory documents.
///
/// `save` is a conditional write: it succeeds only when the stored version
/// still equals `expected_version`, and bumps the version by one. Zero rows
/// affected means the record is missing or was written concurrently.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn get_by_id(&self, kind: EntityKind, id: &str) -> StoreResult<Option<Document>>;

    /// Insert at [`INITIAL_VERSION`]. Fails with [`StoreError::Duplicate`] if the id exists.
    async fn insert(&self, document: &Document) -> StoreResult<()>;

    async fn save(&self, document: &Document, expected_version: i64) -> StoreResult<u64>;

    async fn delete(&self, kind: EntityKind, id: &str) -> StoreResult<u64>;

    async fn find_all(&self, kind: EntityKind, order: OrderKey) -> StoreResult<Vec<Document>>;

    /// Documents whose `field` list contains `value`, ordered by name.
    async fn find_where_list_contains(&self, field: ListField, value: &str) -> StoreResult<Vec<Document>>;

    async fn ping(&self) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_contained_in_plain_list() {
        let body = json!({ "id": "g1", "members": ["u1", "u2"] });
        assert!(ListField::GroupMembers.contained_in(&body, "u2"));
        assert!(!ListField::GroupMembers.contained_in(&body, "u3"));
        assert!(!ListField::RoleGroups.contained_in(&body, "u1"));
    }

    #[test]
    fn test_contained_in_snapshot_list() {
        let body = json!({ "id": "u1", "roles": [{ "id": "r1", "name": "Admin" }] });
        assert!(ListField::UserRoles.contained_in(&body, "r1"));
        assert!(!ListField::UserRoles.contained_in(&body, "Admin"));
    }

    #[test]
    fn test_list_field_kinds() {
        assert_eq!(ListField::GroupMembers.kind(), EntityKind::Group);
        assert_eq!(ListField::RoleGroups.kind(), EntityKind::Role);
        assert_eq!(ListField::UserRoles.kind(), EntityKind::User);
        assert_eq!(EntityKind::Group.table(), "groups");
    }
}
