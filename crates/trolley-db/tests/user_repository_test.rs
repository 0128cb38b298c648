//! Integration tests for the User and Token repositories using
//! in-memory SurrealDB.

use chrono::{Duration, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use trolley_core::error::TrolleyError;
use trolley_core::models::token::{CreateAccessToken, CreateRefreshToken};
use trolley_core::models::user::{CreateUser, UpdateUser};
use trolley_core::password::verify_password;
use trolley_core::repository::{
    MatchOptions, ParentRepository, TokenRepository, UserIncludes, UserRepository,
};
use trolley_db::repository::{SurrealTokenRepository, SurrealUserRepository};

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    trolley_db::run_migrations(&db).await.unwrap();
    db
}

fn create(username: &str, scope: &str) -> CreateUser {
    CreateUser {
        active: true,
        name: Some(format!("User {username}")),
        username: Some(username.into()),
        password: Some("s3cret".into()),
        scope: Some(scope.into()),
    }
}

#[tokio::test]
async fn insert_redacts_password() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo.insert(create("alice", "scope1:admin")).await.unwrap();
    assert_eq!(user.password, "");

    let fetched = repo.find(user.id, &UserIncludes::default()).await.unwrap();
    assert_eq!(fetched.password, "");

    let listed = repo.all(&MatchOptions::default()).await.unwrap();
    assert!(listed.iter().all(|u| u.password.is_empty()));
}

#[tokio::test]
async fn credentials_return_verifiable_hash() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    repo.insert(create("alice", "scope1:admin")).await.unwrap();

    let creds = repo.credentials("alice").await.unwrap();
    assert_eq!(creds.user.username, "alice");
    assert_eq!(creds.user.password, "");
    assert!(verify_password("s3cret", &creds.password_hash, None).unwrap());
    assert!(!verify_password("wrong", &creds.password_hash, None).unwrap());
}

#[tokio::test]
async fn malformed_scope_rejected() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let result = repo.insert(create("bob", "scope1")).await;
    match result {
        Err(TrolleyError::BadRequest { message }) => {
            assert!(
                message.contains("contains malformed permission grants"),
                "{message}"
            );
        }
        other => panic!("expected BadRequest, got {other:?}"),
    }

    // The superuser literal and role grants are both well-formed.
    repo.insert(create("root", "superuser")).await.unwrap();
    repo.insert(create("carol", "scope1:admin scope2:regular"))
        .await
        .unwrap();
}

#[tokio::test]
async fn duplicate_username_rejected() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    repo.insert(create("alice", "scope1:regular")).await.unwrap();

    let result = repo.insert(create("alice", "scope2:regular")).await;
    match result {
        Err(TrolleyError::BadRequest { message }) => {
            assert!(
                message.contains("Username 'alice' is already in use"),
                "{message}"
            );
        }
        other => panic!("expected BadRequest, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_password_update_keeps_hash() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo.insert(create("alice", "scope1:regular")).await.unwrap();

    repo.update(
        user.id,
        UpdateUser {
            password: Some(String::new()),
            name: Some("Renamed".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let creds = repo.credentials("alice").await.unwrap();
    assert!(verify_password("s3cret", &creds.password_hash, None).unwrap());

    repo.update(
        user.id,
        UpdateUser {
            password: Some("changed".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let creds = repo.credentials("alice").await.unwrap();
    assert!(verify_password("changed", &creds.password_hash, None).unwrap());
    assert!(!verify_password("s3cret", &creds.password_hash, None).unwrap());
}

#[tokio::test]
async fn exact_looks_up_by_username() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    repo.insert(create("alice", "scope1:regular")).await.unwrap();

    let found = repo.exact("alice", &UserIncludes::default()).await.unwrap();
    assert_eq!(found.username, "alice");

    let missing = repo.exact("User alice", &UserIncludes::default()).await;
    match missing {
        Err(TrolleyError::NotFound { message }) => {
            assert_eq!(message, "username: Missing User 'User alice'");
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn token_lifecycle() {
    let db = setup().await;
    let users = SurrealUserRepository::new(db.clone());
    let tokens = SurrealTokenRepository::new(db);

    let user = users.insert(create("alice", "scope1:admin")).await.unwrap();
    let expires = Utc::now() + Duration::minutes(15);

    let access = tokens
        .insert_access(CreateAccessToken {
            user_id: user.id,
            token: "access-1".into(),
            expires,
            scope: "scope1:admin".into(),
        })
        .await
        .unwrap();
    tokens
        .insert_refresh(CreateRefreshToken {
            user_id: user.id,
            token: "refresh-1".into(),
            expires: expires + Duration::hours(1),
            access_token: access.token.clone(),
        })
        .await
        .unwrap();

    let found = tokens.find_access("access-1").await.unwrap();
    assert_eq!(found.user_id, user.id);
    assert_eq!(found.scope, "scope1:admin");

    let refresh = tokens.find_refresh("refresh-1").await.unwrap();
    assert_eq!(refresh.access_token, "access-1");

    tokens.relink_refresh("refresh-1", "access-2").await.unwrap();
    let refresh = tokens.find_refresh("refresh-1").await.unwrap();
    assert_eq!(refresh.access_token, "access-2");

    // Revoking the access token takes linked refresh tokens with it.
    tokens.relink_refresh("refresh-1", "access-1").await.unwrap();
    tokens.revoke_access("access-1").await.unwrap();
    assert!(tokens.find_access("access-1").await.is_err());
    assert!(tokens.find_refresh("refresh-1").await.is_err());
}

#[tokio::test]
async fn duplicate_token_value_rejected() {
    let db = setup().await;
    let users = SurrealUserRepository::new(db.clone());
    let tokens = SurrealTokenRepository::new(db);

    let user = users.insert(create("alice", "scope1:admin")).await.unwrap();
    let expires = Utc::now() + Duration::minutes(15);

    tokens
        .insert_access(CreateAccessToken {
            user_id: user.id,
            token: "dup".into(),
            expires,
            scope: String::new(),
        })
        .await
        .unwrap();

    let result = tokens
        .insert_access(CreateAccessToken {
            user_id: user.id,
            token: "dup".into(),
            expires,
            scope: String::new(),
        })
        .await;
    assert!(matches!(result, Err(TrolleyError::BadRequest { .. })));
}

#[tokio::test]
async fn purge_expired_removes_both_kinds() {
    let db = setup().await;
    let users = SurrealUserRepository::new(db.clone());
    let tokens = SurrealTokenRepository::new(db);

    let user = users.insert(create("alice", "scope1:admin")).await.unwrap();
    let past = Utc::now() - Duration::minutes(5);
    let future = Utc::now() + Duration::minutes(15);

    tokens
        .insert_access(CreateAccessToken {
            user_id: user.id,
            token: "stale-access".into(),
            expires: past,
            scope: String::new(),
        })
        .await
        .unwrap();
    tokens
        .insert_refresh(CreateRefreshToken {
            user_id: user.id,
            token: "stale-refresh".into(),
            expires: past,
            access_token: "stale-access".into(),
        })
        .await
        .unwrap();
    tokens
        .insert_access(CreateAccessToken {
            user_id: user.id,
            token: "live-access".into(),
            expires: future,
            scope: String::new(),
        })
        .await
        .unwrap();

    let purged = tokens.purge_expired().await.unwrap();
    assert_eq!(purged, 2);

    assert!(tokens.find_access("stale-access").await.is_err());
    assert!(tokens.find_access("live-access").await.is_ok());
}

#[tokio::test]
async fn removing_user_removes_tokens() {
    let db = setup().await;
    let users = SurrealUserRepository::new(db.clone());
    let tokens = SurrealTokenRepository::new(db);

    let user = users.insert(create("alice", "scope1:admin")).await.unwrap();
    tokens
        .insert_access(CreateAccessToken {
            user_id: user.id,
            token: "access-1".into(),
            expires: Utc::now() + Duration::minutes(15),
            scope: String::new(),
        })
        .await
        .unwrap();

    let with_tokens = users
        .find(
            user.id,
            &UserIncludes {
                access_tokens: true,
                refresh_tokens: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(with_tokens.access_tokens.map(|t| t.len()), Some(1));

    users.remove(user.id).await.unwrap();
    assert!(tokens.find_access("access-1").await.is_err());
}
