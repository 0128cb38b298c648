//! Integration tests for the authentication service.

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use trolley_auth::config::AuthConfig;
use trolley_auth::service::AuthService;
use trolley_core::error::TrolleyError;
use trolley_core::models::user::{CreateUser, UpdateUser};
use trolley_core::repository::{ParentRepository, TokenRepository};
use trolley_db::repository::{SurrealTokenRepository, SurrealUserRepository};
use uuid::Uuid;

type Service = AuthService<SurrealUserRepository<Db>, SurrealTokenRepository<Db>>;

/// Spin up in-memory DB, run migrations, create one active user.
async fn setup(config: AuthConfig) -> (Service, Uuid, Surreal<Db>) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    trolley_db::run_migrations(&db).await.unwrap();

    let users = SurrealUserRepository::new(db.clone());
    let user = users
        .insert(CreateUser {
            active: true,
            name: Some("Alice".into()),
            username: Some("alice".into()),
            password: Some("hunter2".into()),
            scope: Some("scope1:admin".into()),
        })
        .await
        .unwrap();

    let tokens = SurrealTokenRepository::new(db.clone());
    (AuthService::new(users, tokens, config), user.id, db)
}

fn forbidden_message(result: Result<impl std::fmt::Debug, TrolleyError>) -> String {
    match result {
        Err(TrolleyError::Forbidden { message }) => message,
        other => panic!("expected Forbidden, got {other:?}"),
    }
}

#[tokio::test]
async fn issue_returns_scoped_token_pair() {
    let (service, user_id, db) = setup(AuthConfig::default()).await;

    let grant = service.issue("alice", "hunter2").await.unwrap();
    assert_eq!(grant.scope, "scope1:admin");
    assert_eq!(grant.expires_in, 900);
    assert_ne!(grant.access_token, grant.refresh_token);

    let auth = service.resolve(&grant.access_token).await.unwrap();
    assert_eq!(auth.user_id, user_id);
    assert_eq!(auth.scope, "scope1:admin");

    // The refresh token is linked to the issued access token.
    let tokens = SurrealTokenRepository::new(db);
    let refresh = tokens.find_refresh(&grant.refresh_token).await.unwrap();
    assert_eq!(refresh.access_token, grant.access_token);
}

#[tokio::test]
async fn wrong_password_and_unknown_user_look_alike() {
    let (service, _, _) = setup(AuthConfig::default()).await;

    let wrong = forbidden_message(service.issue("alice", "wrong").await);
    let unknown = forbidden_message(service.issue("nobody", "hunter2").await);
    assert_eq!(wrong, unknown);
    assert_eq!(wrong, "Invalid username or password");
}

#[tokio::test]
async fn inactive_account_rejected() {
    let (service, user_id, db) = setup(AuthConfig::default()).await;

    let users = SurrealUserRepository::new(db);
    users
        .update(
            user_id,
            UpdateUser {
                active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let message = forbidden_message(service.issue("alice", "hunter2").await);
    assert_eq!(message, "Account is inactive");
}

#[tokio::test]
async fn expired_access_token_rejected() {
    let config = AuthConfig {
        access_token_lifetime_secs: 0,
        ..Default::default()
    };
    let (service, _, _) = setup(config).await;

    let grant = service.issue("alice", "hunter2").await.unwrap();
    let result = service.resolve(&grant.access_token).await;
    let message = forbidden_message(result);
    assert_eq!(message, "Token has expired");
}

#[tokio::test]
async fn unknown_access_token_rejected() {
    let (service, _, _) = setup(AuthConfig::default()).await;

    let message = forbidden_message(service.resolve("made-up").await);
    assert_eq!(message, "Invalid token");
}

#[tokio::test]
async fn refresh_rotates_access_and_resnapshots_scope() {
    let (service, user_id, db) = setup(AuthConfig::default()).await;

    let grant = service.issue("alice", "hunter2").await.unwrap();

    // Scope change lands in the next refreshed access token.
    let users = SurrealUserRepository::new(db);
    users
        .update(
            user_id,
            UpdateUser {
                scope: Some("scope2:regular".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let rotated = service.refresh(&grant.refresh_token).await.unwrap();
    assert_eq!(rotated.refresh_token, grant.refresh_token);
    assert_ne!(rotated.access_token, grant.access_token);
    assert_eq!(rotated.scope, "scope2:regular");

    // The original access token's snapshot is untouched.
    let original = service.resolve(&grant.access_token).await.unwrap();
    assert_eq!(original.scope, "scope1:admin");
}

#[tokio::test]
async fn refresh_with_unknown_token_rejected() {
    let (service, _, _) = setup(AuthConfig::default()).await;

    let message = forbidden_message(service.refresh("made-up").await);
    assert_eq!(message, "Invalid token");
}

#[tokio::test]
async fn revoke_invalidates_pair() {
    let (service, _, _) = setup(AuthConfig::default()).await;

    let grant = service.issue("alice", "hunter2").await.unwrap();
    service.revoke(&grant.access_token).await.unwrap();

    assert!(service.resolve(&grant.access_token).await.is_err());
    assert!(service.refresh(&grant.refresh_token).await.is_err());
}
