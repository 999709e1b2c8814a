//! Bulk coordinator tests: one role or user against many targets.

use std::sync::Arc;

use lde_config::MembershipConfig;
use lde_directory::{DirectoryError, EntityService, Group, MembershipEngine, MemoryStore, Role, User};

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

async fn setup() -> (EntityService, MembershipEngine) {
    let store = Arc::new(MemoryStore::new());
    let config = MembershipConfig::default();
    let entities = EntityService::new(store.clone(), &config);
    let engine = MembershipEngine::new(store, &config);

    for (id, name) in [("u1", "Ada"), ("u2", "Bob"), ("u3", "Cy")] {
        entities
            .create(User::new(id, format!("{id}@example.com"), name))
            .await
            .unwrap();
    }
    entities.create(Group::new("g1", "Engineering")).await.unwrap();
    entities.create(Group::new("g2", "Design")).await.unwrap();
    entities.create(Role::new("r1", "Admin")).await.unwrap();

    (entities, engine)
}

#[tokio::test]
async fn test_assign_role_to_every_user() {
    let (_, engine) = setup().await;

    let outcome = engine.bulk_assign_role_to_users("r1", &ids(&["u1", "u2"])).await.unwrap();

    assert_eq!(outcome.success_count, 2);
    assert!(outcome.is_complete());
    assert_eq!(engine.users_with_role("r1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_assign_role_partial_success() {
    let (_, engine) = setup().await;
    engine.assign_role_to_user("u2", "r1").await.unwrap();

    let outcome = engine
        .bulk_assign_role_to_users("r1", &ids(&["u1", "u2", "ghost", "u3"]))
        .await
        .unwrap();

    assert_eq!(outcome.success_count, 2);
    let failed: Vec<&str> = outcome.failures.iter().map(|f| f.target_id.as_str()).collect();
    assert_eq!(failed, vec!["u2", "ghost"]);
    assert_eq!(outcome.failures[0].error, "user u2 already has role r1");
    assert_eq!(outcome.failures[1].error, "user not found: ghost");
}

#[tokio::test]
async fn test_assign_role_to_no_user_fails() {
    let (_, engine) = setup().await;

    let err = engine
        .bulk_assign_role_to_users("r1", &ids(&["ghost", "phantom"]))
        .await
        .unwrap_err();

    match &err {
        DirectoryError::BulkFailure { message, failures } => {
            assert_eq!(message, "failed to assign role Admin to any users");
            assert_eq!(failures.len(), 2);
        }
        other => panic!("expected bulk failure, got {other:?}"),
    }
    assert!(err.to_string().contains("ghost: user not found: ghost"));
}

#[tokio::test]
async fn test_unknown_role_fails_before_touching_users() {
    let (_, engine) = setup().await;

    let err = engine.bulk_assign_role_to_users("nope", &ids(&["u1"])).await.unwrap_err();

    assert!(matches!(err, DirectoryError::NotFound { .. }));
    assert!(engine.user_roles("u1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_target_list_is_a_failure() {
    let (_, engine) = setup().await;

    let err = engine.bulk_assign_role_to_users("r1", &[]).await.unwrap_err();
    assert!(matches!(err, DirectoryError::BulkFailure { ref failures, .. } if failures.is_empty()));
}

#[tokio::test]
async fn test_remove_role_from_users() {
    let (_, engine) = setup().await;
    engine.bulk_assign_role_to_users("r1", &ids(&["u1", "u2"])).await.unwrap();

    let outcome = engine
        .bulk_remove_role_from_users("r1", &ids(&["u1", "u3"]))
        .await
        .unwrap();
    assert_eq!(outcome.success_count, 1);
    assert_eq!(outcome.failures[0].target_id, "u3");

    let err = engine
        .bulk_remove_role_from_users("r1", &ids(&["u1", "u3"]))
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("failed to remove role Admin from any users"));
}

#[tokio::test]
async fn test_add_user_to_groups() {
    let (_, engine) = setup().await;

    let outcome = engine
        .bulk_add_user_to_groups("u1", &ids(&["g1", "missing", "g2"]))
        .await
        .unwrap();

    assert_eq!(outcome.success_count, 2);
    assert_eq!(outcome.failures[0].error, "group not found: missing");

    let groups = engine.groups_for_user("u1").await.unwrap();
    assert_eq!(groups.len(), 2);
}

#[tokio::test]
async fn test_remove_user_from_groups() {
    let (_, engine) = setup().await;
    engine.bulk_add_user_to_groups("u1", &ids(&["g1", "g2"])).await.unwrap();

    let outcome = engine
        .bulk_remove_user_from_groups("u1", &ids(&["g2", "g1"]))
        .await
        .unwrap();
    assert!(outcome.is_complete());

    let err = engine
        .bulk_remove_user_from_groups("u1", &ids(&["g1"]))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "failed to remove user u1 from any groups: [g1: user u1 is not a member of group g1]"
    );
}
