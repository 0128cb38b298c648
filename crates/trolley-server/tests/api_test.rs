//! End-to-end API tests over an in-memory database.

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use trolley_auth::AuthConfig;
use trolley_core::models::group::CreateGroup;
use trolley_core::models::user::CreateUser;
use trolley_core::repository::ParentRepository;
use trolley_db::{DbConfig, DbManager, run_migrations};
use trolley_server::{AppState, build_router, build_state};
use uuid::Uuid;

const PASSWORD: &str = "hunter2";

struct TestApp {
    router: Router,
    state: AppState,
    first_group: Uuid,
    second_group: Uuid,
}

async fn setup() -> TestApp {
    let manager = DbManager::connect(&DbConfig::default()).await.unwrap();
    run_migrations(manager.client()).await.unwrap();
    let state = build_state(manager.client().clone(), AuthConfig::default());

    let first_group = seed_group(&state, "First Group", "scope1").await;
    let second_group = seed_group(&state, "Second Group", "scope2").await;

    for (username, scope) in [
        ("root", "superuser"),
        ("firstadmin", "scope1:admin"),
        ("firstregular", "scope1:regular"),
    ] {
        state
            .users
            .insert(CreateUser {
                active: true,
                name: Some(username.to_string()),
                username: Some(username.to_string()),
                password: Some(PASSWORD.to_string()),
                scope: Some(scope.to_string()),
            })
            .await
            .unwrap();
    }

    TestApp {
        router: build_router(state.clone()),
        state,
        first_group,
        second_group,
    }
}

async fn seed_group(state: &AppState, name: &str, scope: &str) -> Uuid {
    state
        .groups
        .insert(CreateGroup {
            active: true,
            name: Some(name.to_string()),
            scope: Some(scope.to_string()),
            email: None,
            notes: None,
        })
        .await
        .unwrap()
        .id
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn token_for(router: &Router, username: &str) -> String {
    let (status, body) = send(
        router,
        request(
            Method::POST,
            "/oauth/token",
            None,
            Some(json!({
                "grant_type": "password",
                "username": username,
                "password": PASSWORD,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "token grant failed: {body}");
    body["access_token"].as_str().unwrap().to_string()
}

fn message(body: &Value) -> &str {
    body["message"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn health_is_open() {
    let app = setup().await;
    let (status, body) = send(&app.router, request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn anonymous_can_list_groups_but_not_read_one() {
    let app = setup().await;

    let (status, body) = send(&app.router, request(Method::GET, "/api/groups", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let uri = format!("/api/groups/{}", app.first_group);
    let (status, body) = send(&app.router, request(Method::GET, &uri, None, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(message(&body), "No access token presented");
}

#[tokio::test]
async fn password_grant_issues_bearer_tokens() {
    let app = setup().await;

    let (status, body) = send(
        &app.router,
        request(
            Method::POST,
            "/oauth/token",
            None,
            Some(json!({
                "grant_type": "password",
                "username": "firstadmin",
                "password": PASSWORD,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["scope"], "scope1:admin");
    assert!(body["access_token"].as_str().unwrap().len() > 30);
    assert!(body["refresh_token"].as_str().unwrap().len() > 30);
    assert!(body["expires_in"].as_u64().unwrap() > 0);

    let (status, body) = send(
        &app.router,
        request(
            Method::POST,
            "/oauth/token",
            None,
            Some(json!({
                "grant_type": "password",
                "username": "firstadmin",
                "password": "wrong",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(message(&body), "Invalid username or password");
}

#[tokio::test]
async fn unsupported_grant_type_rejected() {
    let app = setup().await;
    let (status, body) = send(
        &app.router,
        request(
            Method::POST,
            "/oauth/token",
            None,
            Some(json!({ "grant_type": "client_credentials" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        message(&body),
        "grantType: Unsupported grant type 'client_credentials'"
    );
}

#[tokio::test]
async fn refresh_grant_rotates_access_token() {
    let app = setup().await;

    let (_, grant) = send(
        &app.router,
        request(
            Method::POST,
            "/oauth/token",
            None,
            Some(json!({
                "grant_type": "password",
                "username": "firstadmin",
                "password": PASSWORD,
            })),
        ),
    )
    .await;
    let refresh = grant["refresh_token"].as_str().unwrap();

    let (status, body) = send(
        &app.router,
        request(
            Method::POST,
            "/oauth/token",
            None,
            Some(json!({
                "grant_type": "refresh_token",
                "refresh_token": refresh,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["refresh_token"], refresh);
    assert_ne!(body["access_token"], grant["access_token"]);
}

#[tokio::test]
async fn group_scope_separates_tenants() {
    let app = setup().await;
    let token = token_for(&app.router, "firstadmin").await;
    let payload = json!({ "name": "Produce" });

    let uri = format!("/api/categories/{}", app.first_group);
    let (status, body) = send(
        &app.router,
        request(Method::POST, &uri, Some(&token), Some(payload.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Produce");

    let uri = format!("/api/categories/{}", app.second_group);
    let (status, body) = send(
        &app.router,
        request(Method::POST, &uri, Some(&token), Some(payload)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(message(&body), "Required scope not authorized");

    // Reads of the foreign group are refused the same way, not 404.
    let uri = format!("/api/groups/{}", app.second_group);
    let (status, body) = send(&app.router, request(Method::GET, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(message(&body), "Required scope not authorized");
}

#[tokio::test]
async fn regular_role_reads_but_cannot_mutate() {
    let app = setup().await;
    let token = token_for(&app.router, "firstregular").await;

    let uri = format!("/api/categories/{}", app.first_group);
    let (status, _) = send(&app.router, request(Method::GET, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app.router,
        request(
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({ "name": "Produce" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(message(&body), "Required scope not authorized");

    // User administration stays superuser-only.
    let (status, _) = send(
        &app.router,
        request(Method::GET, "/api/users", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn superuser_crosses_all_groups() {
    let app = setup().await;
    let token = token_for(&app.router, "root").await;

    let (status, created) = send(
        &app.router,
        request(
            Method::POST,
            "/api/groups",
            Some(&token),
            Some(json!({ "name": "Third Group", "scope": "scope3" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let group_id = created["id"].as_str().unwrap().to_string();

    let uri = format!("/api/categories/{}", app.second_group);
    let (status, _) = send(
        &app.router,
        request(
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({ "name": "Bakery" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/api/groups/{group_id}");
    let (status, removed) = send(
        &app.router,
        request(Method::DELETE, &uri, Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removed["name"], "Third Group");
}

#[tokio::test]
async fn item_lifecycle_over_http() {
    let app = setup().await;
    let token = token_for(&app.router, "firstadmin").await;

    let uri = format!("/api/categories/{}", app.first_group);
    let (_, category) = send(
        &app.router,
        request(
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({ "name": "Produce" })),
        ),
    )
    .await;
    let category_id = category["id"].as_str().unwrap();

    let uri = format!("/api/items/{}", app.first_group);
    let (status, item) = send(
        &app.router,
        request(
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({ "name": "Apples", "category_id": category_id })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{item}");

    let uri = format!("/api/items/{}?withCategory", app.first_group);
    let (status, listed) = send(&app.router, request(Method::GET, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["category"]["name"], "Produce");

    let uri = format!("/api/items/{}/exact/Apples", app.first_group);
    let (status, found) = send(&app.router, request(Method::GET, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["id"], item["id"]);

    let uri = format!(
        "/api/items/{}/{}",
        app.first_group,
        item["id"].as_str().unwrap()
    );
    let (status, _) = send(
        &app.router,
        request(Method::DELETE, &uri, Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn passwords_are_redacted_in_responses() {
    let app = setup().await;
    let token = token_for(&app.router, "root").await;

    let (status, body) = send(
        &app.router,
        request(Method::GET, "/api/users", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 3);
    for user in users {
        assert_eq!(user["password"], "");
    }
}

#[tokio::test]
async fn scope_change_takes_effect_immediately() {
    let app = setup().await;
    let admin = token_for(&app.router, "firstadmin").await;
    let root = token_for(&app.router, "root").await;

    // Prime the scope cache through a successful request.
    let uri = format!("/api/groups/{}", app.first_group);
    let (status, _) = send(&app.router, request(Method::GET, &uri, Some(&admin), None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app.router,
        request(
            Method::PUT,
            &uri,
            Some(&root),
            Some(json!({ "scope": "rescoped" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The cached scope must not keep authorizing the old grant.
    let (status, body) = send(&app.router, request(Method::GET, &uri, Some(&admin), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(message(&body), "Required scope not authorized");
}

#[tokio::test]
async fn missing_group_is_forbidden_except_for_superusers() {
    let app = setup().await;
    let admin = token_for(&app.router, "firstadmin").await;
    let root = token_for(&app.router, "root").await;
    let uri = format!("/api/groups/{}", Uuid::new_v4());

    let (status, body) = send(&app.router, request(Method::GET, &uri, None, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(message(&body), "No access token presented");

    // Existence is not leaked to callers without a matching grant.
    let (status, body) = send(&app.router, request(Method::GET, &uri, Some(&admin), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(message(&body), "Required scope not authorized");

    // Superusers skip scope matching and see the real NotFound.
    let (status, body) = send(&app.router, request(Method::GET, &uri, Some(&root), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(message(&body).contains("Missing Group"));
}

#[tokio::test]
async fn group_child_listings_attach_includes() {
    let app = setup().await;
    let token = token_for(&app.router, "firstadmin").await;

    let uri = format!("/api/categories/{}", app.first_group);
    let (_, category) = send(
        &app.router,
        request(
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({ "name": "Produce" })),
        ),
    )
    .await;
    let uri = format!("/api/items/{}", app.first_group);
    send(
        &app.router,
        request(
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({ "name": "Apples", "category_id": category["id"] })),
        ),
    )
    .await;

    let uri = format!("/api/groups/{}/categories?withGroup", app.first_group);
    let (status, body) = send(&app.router, request(Method::GET, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["group"]["name"], "First Group");

    let uri = format!("/api/groups/{}/items?withCategory", app.first_group);
    let (status, body) = send(&app.router, request(Method::GET, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["category"]["name"], "Produce");

    let uri = format!("/api/groups/{}/lists", app.first_group);
    let (status, body) = send(&app.router, request(Method::GET, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_uuid_in_path_is_a_bad_request() {
    let app = setup().await;
    let token = token_for(&app.router, "root").await;

    let (status, body) = send(
        &app.router,
        request(Method::GET, "/api/groups/not-a-uuid", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "groupId: 'not-a-uuid' is not a valid UUID");
}

#[tokio::test]
async fn revoked_token_stops_working() {
    let app = setup().await;
    let token = token_for(&app.router, "firstadmin").await;

    let (status, _) = send(
        &app.router,
        request(Method::DELETE, "/oauth/token", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let uri = format!("/api/groups/{}", app.first_group);
    let (status, body) = send(&app.router, request(Method::GET, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(message(&body), "Invalid token");

    let (status, body) = send(
        &app.router,
        request(Method::DELETE, "/oauth/token", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(message(&body), "No access token presented");
}

#[tokio::test]
async fn validation_errors_surface_as_bad_request() {
    let app = setup().await;
    let token = token_for(&app.router, "root").await;

    let (status, body) = send(
        &app.router,
        request(
            Method::POST,
            "/api/groups",
            Some(&token),
            Some(json!({ "scope": "has spaces" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(message(&body).contains("name: Is required"));
    assert!(message(&body).contains("must not contain spaces"));
}
