//! Integration tests for the Group repository using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use trolley_core::error::TrolleyError;
use trolley_core::models::group::{CreateGroup, UpdateGroup};
use trolley_core::repository::{GroupIncludes, GroupRepository, MatchOptions, ParentRepository};
use trolley_db::repository::SurrealGroupRepository;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    trolley_db::run_migrations(&db).await.unwrap();
    db
}

fn create(name: &str, scope: &str) -> CreateGroup {
    CreateGroup {
        active: true,
        name: Some(name.into()),
        scope: Some(scope.into()),
        email: None,
        notes: None,
    }
}

#[tokio::test]
async fn insert_and_find_group() {
    let db = setup().await;
    let repo = SurrealGroupRepository::new(db);

    let group = repo.insert(create("First Group", "scope1")).await.unwrap();
    assert_eq!(group.name, "First Group");
    assert_eq!(group.scope, "scope1");
    assert!(group.active);

    let fetched = repo.find(group.id, &GroupIncludes::default()).await.unwrap();
    assert_eq!(fetched.id, group.id);
    assert_eq!(fetched.name, "First Group");
}

#[tokio::test]
async fn missing_required_fields_aggregate() {
    let db = setup().await;
    let repo = SurrealGroupRepository::new(db);

    let result = repo
        .insert(CreateGroup {
            active: true,
            name: None,
            scope: None,
            email: None,
            notes: None,
        })
        .await;

    match result {
        Err(TrolleyError::BadRequest { message }) => {
            assert!(message.contains("name: Is required"), "{message}");
            assert!(message.contains("scope: Is required"), "{message}");
        }
        other => panic!("expected BadRequest, got {other:?}"),
    }
}

#[tokio::test]
async fn duplicate_name_and_scope_rejected() {
    let db = setup().await;
    let repo = SurrealGroupRepository::new(db);

    repo.insert(create("First Group", "scope1")).await.unwrap();

    let result = repo.insert(create("First Group", "scope1")).await;
    match result {
        Err(TrolleyError::BadRequest { message }) => {
            assert!(
                message.contains("Name 'First Group' is already in use"),
                "{message}"
            );
            assert!(
                message.contains("Scope 'scope1' is already in use"),
                "{message}"
            );
        }
        other => panic!("expected BadRequest, got {other:?}"),
    }
}

#[tokio::test]
async fn scope_with_spaces_rejected() {
    let db = setup().await;
    let repo = SurrealGroupRepository::new(db);

    let result = repo.insert(create("Spacey", "bad scope")).await;
    match result {
        Err(TrolleyError::BadRequest { message }) => {
            assert!(message.contains("must not contain spaces"), "{message}");
        }
        other => panic!("expected BadRequest, got {other:?}"),
    }
}

#[tokio::test]
async fn update_group_partial() {
    let db = setup().await;
    let repo = SurrealGroupRepository::new(db);

    let group = repo.insert(create("Original", "orig")).await.unwrap();

    let updated = repo
        .update(
            group.id,
            UpdateGroup {
                name: Some("Renamed".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.scope, "orig");
}

#[tokio::test]
async fn update_keeps_own_name_valid() {
    let db = setup().await;
    let repo = SurrealGroupRepository::new(db);

    let group = repo.insert(create("Keeper", "keep")).await.unwrap();

    // Re-submitting the current name must not trip the uniqueness check.
    let updated = repo
        .update(
            group.id,
            UpdateGroup {
                name: Some("Keeper".into()),
                notes: Some("updated".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Keeper");
    assert_eq!(updated.notes.as_deref(), Some("updated"));
}

#[tokio::test]
async fn exact_requires_single_match() {
    let db = setup().await;
    let repo = SurrealGroupRepository::new(db);

    repo.insert(create("Exact Group", "exact")).await.unwrap();

    let found = repo
        .exact("Exact Group", &GroupIncludes::default())
        .await
        .unwrap();
    assert_eq!(found.name, "Exact Group");

    // Case-sensitive: a different casing is a miss.
    let missing = repo.exact("exact group", &GroupIncludes::default()).await;
    match missing {
        Err(TrolleyError::NotFound { message }) => {
            assert_eq!(message, "name: Missing Group 'exact group'");
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn all_filters_and_paginates() {
    let db = setup().await;
    let repo = SurrealGroupRepository::new(db);

    repo.insert(create("Alpha Group", "alpha")).await.unwrap();
    repo.insert(create("Beta Group", "beta")).await.unwrap();
    let inactive = repo.insert(create("Gamma Group", "gamma")).await.unwrap();
    repo.update(
        inactive.id,
        UpdateGroup {
            active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let everything = repo.all(&MatchOptions::default()).await.unwrap();
    assert_eq!(everything.len(), 3);
    // Sorted by name.
    assert_eq!(everything[0].name, "Alpha Group");
    assert_eq!(everything[2].name, "Gamma Group");

    let active_only = repo
        .all(&MatchOptions {
            active: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(active_only.len(), 2);

    // Case-insensitive substring filter.
    let filtered = repo
        .all(&MatchOptions {
            name: Some("beta".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].name, "Beta Group");

    let page = repo
        .all(&MatchOptions {
            limit: Some(2),
            offset: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].name, "Beta Group");
}

#[tokio::test]
async fn remove_returns_group_and_deletes() {
    let db = setup().await;
    let repo = SurrealGroupRepository::new(db);

    let group = repo.insert(create("Doomed", "doom")).await.unwrap();
    let removed = repo.remove(group.id).await.unwrap();
    assert_eq!(removed.id, group.id);

    let result = repo.find(group.id, &GroupIncludes::default()).await;
    match result {
        Err(TrolleyError::NotFound { message }) => {
            assert_eq!(message, format!("groupId: Missing Group '{}'", group.id));
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn child_listings_require_existing_group() {
    let db = setup().await;
    let repo = SurrealGroupRepository::new(db);

    let group = repo.insert(create("Parent", "parent")).await.unwrap();
    let categories = repo
        .categories(group.id, &MatchOptions::default())
        .await
        .unwrap();
    assert!(categories.is_empty());

    let ghost = uuid::Uuid::new_v4();
    let result = repo.categories(ghost, &MatchOptions::default()).await;
    assert!(matches!(result, Err(TrolleyError::NotFound { .. })));
}
