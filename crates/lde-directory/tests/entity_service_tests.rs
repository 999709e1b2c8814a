//! Entity CRUD tests against the in-memory store.

use std::sync::Arc;

use lde_config::MembershipConfig;
use lde_directory::{DirectoryError, EntityService, Group, MemoryStore, Role, User};

fn service() -> EntityService {
    EntityService::new(Arc::new(MemoryStore::new()), &MembershipConfig::default())
}

#[tokio::test]
async fn test_create_assigns_id_when_empty() {
    let entities = service();

    let user = entities.create(User::new("", "ada@example.com", "Ada")).await.unwrap();

    assert!(!user.id.is_empty());
    assert!(uuid::Uuid::parse_str(&user.id).is_ok());
    let stored: User = entities.get(&user.id).await.unwrap();
    assert_eq!(stored.email, "ada@example.com");
}

#[tokio::test]
async fn test_create_keeps_given_id() {
    let entities = service();

    let group = entities.create(Group::new("g1", "Engineering")).await.unwrap();
    assert_eq!(group.id, "g1");
}

#[tokio::test]
async fn test_create_duplicate_id() {
    let entities = service();
    entities.create(Role::new("r1", "Admin")).await.unwrap();

    let err = entities.create(Role::new("r1", "Other")).await.unwrap_err();

    assert!(matches!(err, DirectoryError::Duplicate { .. }));
    assert_eq!(entities.get::<Role>("r1").await.unwrap().name, "Admin");
}

#[tokio::test]
async fn test_create_rejects_duplicate_list_entries() {
    let entities = service();

    let err = entities
        .create(Group::new("g1", "Engineering").with_members(["u1", "u1"]))
        .await
        .unwrap_err();

    assert!(matches!(err, DirectoryError::Validation { .. }));
    assert!(entities.get::<Group>("g1").await.is_err());
}

#[tokio::test]
async fn test_get_missing() {
    let entities = service();

    let err = entities.get::<User>("u404").await.unwrap_err();
    assert_eq!(err.to_string(), "user not found: u404");
    assert_eq!(err.code(), "NOT_FOUND");
}

#[tokio::test]
async fn test_list_ordered_by_name() {
    let entities = service();
    entities.create(Group::new("g1", "Zeta")).await.unwrap();
    entities.create(Group::new("g2", "Alpha")).await.unwrap();
    entities.create(Group::new("g3", "Mu")).await.unwrap();

    let names: Vec<String> = entities
        .list::<Group>()
        .await
        .unwrap()
        .into_iter()
        .map(|g| g.name)
        .collect();

    assert_eq!(names, vec!["Alpha", "Mu", "Zeta"]);
    assert!(entities.list::<Role>().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_uses_path_id() {
    let entities = service();
    entities.create(Group::new("g1", "Engineering")).await.unwrap();

    let updated = entities
        .update("g1", Group::new("other", "Platform").with_members(["u1"]))
        .await
        .unwrap();

    assert_eq!(updated.id, "g1");
    let stored: Group = entities.get("g1").await.unwrap();
    assert_eq!(stored.name, "Platform");
    assert_eq!(stored.members, vec!["u1".to_string()]);
    assert!(entities.get::<Group>("other").await.is_err());
}

#[tokio::test]
async fn test_update_missing() {
    let entities = service();

    let err = entities.update("r9", Role::new("r9", "Ghost")).await.unwrap_err();
    assert!(matches!(err, DirectoryError::NotFound { .. }));
}

#[tokio::test]
async fn test_delete() {
    let entities = service();
    entities.create(User::new("u1", "ada@example.com", "Ada")).await.unwrap();

    entities.delete::<User>("u1").await.unwrap();

    assert!(entities.get::<User>("u1").await.is_err());
    let err = entities.delete::<User>("u1").await.unwrap_err();
    assert_eq!(err.to_string(), "user not found: u1");
}

#[tokio::test]
async fn test_delete_leaves_references() {
    let entities = service();
    entities
        .create(Group::new("g1", "Engineering").with_members(["u1"]))
        .await
        .unwrap();
    entities.create(User::new("u1", "ada@example.com", "Ada")).await.unwrap();

    entities.delete::<User>("u1").await.unwrap();

    let group: Group = entities.get("g1").await.unwrap();
    assert_eq!(group.members, vec!["u1".to_string()]);
}

#[tokio::test]
async fn test_ping() {
    assert!(service().ping().await.is_ok());
}
