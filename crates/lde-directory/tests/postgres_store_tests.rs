//! PostgreSQL store tests. Needs Docker:
//!
//! ```sh
//! cargo test -p lde-directory --features postgres-tests --test postgres_store_tests
//! ```

#![cfg(feature = "postgres-tests")]

use std::sync::Arc;

use lde_config::{DatabaseConfig, MembershipConfig};
use lde_directory::store::{Document, ListField, OrderKey};
use lde_directory::{
    DirectoryStore, EntityKind, EntityService, Group, MembershipEngine, PgStore, Role, StoreError, User,
};
use serde_json::json;
use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;

struct TestDb {
    _container: ContainerAsync<Postgres>,
    store: Arc<PgStore>,
}

async fn start() -> TestDb {
    let container = Postgres::default().with_tag("16-alpine").start().await.unwrap();
    let port = container.get_host_port_ipv4(5432).await.unwrap();

    let config = DatabaseConfig {
        connection_string: format!("postgres://postgres:@127.0.0.1:{port}/postgres"),
        password: Some("postgres".to_string()),
        ..DatabaseConfig::default()
    };
    let store = PgStore::connect(&config).await.unwrap();

    TestDb {
        _container: container,
        store: Arc::new(store),
    }
}

fn document(kind: EntityKind, id: &str, name: &str, body: serde_json::Value) -> Document {
    Document {
        kind,
        id: id.to_string(),
        name: name.to_string(),
        version: 1,
        body,
    }
}

#[tokio::test]
async fn test_insert_get_and_duplicate() {
    let db = start().await;
    let doc = document(EntityKind::Group, "g1", "Engineering", json!({"id": "g1", "name": "Engineering", "members": []}));

    db.store.insert(&doc).await.unwrap();
    let stored = db.store.get_by_id(EntityKind::Group, "g1").await.unwrap().unwrap();
    assert_eq!(stored.version, 1);
    assert_eq!(stored.body["name"], "Engineering");

    let err = db.store.insert(&doc).await.unwrap_err();
    assert!(matches!(err, StoreError::Duplicate { .. }));

    assert!(db.store.get_by_id(EntityKind::User, "g1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_conditional_save() {
    let db = start().await;
    let mut doc = document(EntityKind::Role, "r1", "Admin", json!({"id": "r1", "name": "Admin", "groups": []}));
    db.store.insert(&doc).await.unwrap();

    doc.body["groups"] = json!(["g1"]);
    assert_eq!(db.store.save(&doc, 1).await.unwrap(), 1);
    assert_eq!(db.store.save(&doc, 1).await.unwrap(), 0);

    let stored = db.store.get_by_id(EntityKind::Role, "r1").await.unwrap().unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(stored.body["groups"], json!(["g1"]));
}

#[tokio::test]
async fn test_delete_and_ordering() {
    let db = start().await;
    for (id, name) in [("u1", "Zed"), ("u2", "Amy"), ("u3", "Max")] {
        db.store
            .insert(&document(EntityKind::User, id, name, json!({"id": id, "name": name})))
            .await
            .unwrap();
    }

    let names: Vec<String> = db
        .store
        .find_all(EntityKind::User, OrderKey::Name)
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(names, vec!["Amy", "Max", "Zed"]);

    assert_eq!(db.store.delete(EntityKind::User, "u2").await.unwrap(), 1);
    assert_eq!(db.store.delete(EntityKind::User, "u2").await.unwrap(), 0);
    assert_eq!(db.store.find_all(EntityKind::User, OrderKey::Id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_list_containment() {
    let db = start().await;
    db.store
        .insert(&document(EntityKind::Group, "g1", "B", json!({"id": "g1", "members": ["u1", "u2"]})))
        .await
        .unwrap();
    db.store
        .insert(&document(EntityKind::Group, "g2", "A", json!({"id": "g2", "members": ["u2"]})))
        .await
        .unwrap();
    db.store
        .insert(&document(EntityKind::User, "u1", "Ada", json!({"id": "u1", "roles": [{"id": "r1", "name": "Admin"}]})))
        .await
        .unwrap();

    let groups = db.store.find_where_list_contains(ListField::GroupMembers, "u2").await.unwrap();
    let ids: Vec<&str> = groups.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["g2", "g1"]);

    let users = db.store.find_where_list_contains(ListField::UserRoles, "r1").await.unwrap();
    assert_eq!(users.len(), 1);
    assert!(db.store.find_where_list_contains(ListField::UserRoles, "Admin").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_membership_engine_on_postgres() {
    let db = start().await;
    let store: Arc<dyn DirectoryStore> = db.store.clone();
    let config = MembershipConfig::default();
    let entities = EntityService::new(store.clone(), &config);
    let engine = MembershipEngine::new(store, &config);

    entities.create(User::new("u1", "ada@example.com", "Ada")).await.unwrap();
    entities.create(Group::new("g1", "Engineering")).await.unwrap();
    entities.create(Role::new("r1", "Admin").with_groups(["g1"])).await.unwrap();

    engine.add_user_to_group("g1", "u1").await.unwrap();
    engine.assign_role_to_user("u1", "r1").await.unwrap();

    assert_eq!(engine.groups_for_user("u1").await.unwrap()[0].id, "g1");
    assert_eq!(engine.roles_for_group("g1").await.unwrap()[0].id, "r1");
    assert_eq!(engine.users_with_role("r1").await.unwrap()[0].id, "u1");
    assert_eq!(engine.user_roles("u1").await.unwrap()[0].groups, vec!["g1".to_string()]);
}
