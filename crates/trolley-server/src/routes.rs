//! Route table.
//!
//! Child entities hang off `/api/<entity>/:group_id/...` so the
//! tenant partition is explicit in every URL.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{categories, groups, health, items, lists, tokens, users};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let group_routes = Router::new()
        .route("/", get(groups::list).post(groups::create))
        .route("/exact/:name", get(groups::exact))
        .route(
            "/:group_id",
            get(groups::find).put(groups::update).delete(groups::remove),
        )
        .route("/:group_id/categories", get(groups::categories))
        .route("/:group_id/items", get(groups::items))
        .route("/:group_id/lists", get(groups::lists));

    let category_routes = Router::new()
        .route("/:group_id", get(categories::list).post(categories::create))
        .route("/:group_id/exact/:name", get(categories::exact))
        .route(
            "/:group_id/:category_id",
            get(categories::find)
                .put(categories::update)
                .delete(categories::remove),
        );

    let list_routes = Router::new()
        .route("/:group_id", get(lists::list).post(lists::create))
        .route("/:group_id/exact/:name", get(lists::exact))
        .route(
            "/:group_id/:list_id",
            get(lists::find).put(lists::update).delete(lists::remove),
        );

    let item_routes = Router::new()
        .route("/:group_id", get(items::list).post(items::create))
        .route("/:group_id/exact/:name", get(items::exact))
        .route(
            "/:group_id/:item_id",
            get(items::find).put(items::update).delete(items::remove),
        );

    let user_routes = Router::new()
        .route("/", get(users::list).post(users::create))
        .route("/exact/:username", get(users::exact))
        .route(
            "/:user_id",
            get(users::find).put(users::update).delete(users::remove),
        );

    Router::new()
        .route("/health", get(health::health))
        .route("/oauth/token", post(tokens::issue).delete(tokens::revoke))
        .nest("/api/groups", group_routes)
        .nest("/api/categories", category_routes)
        .nest("/api/lists", list_routes)
        .nest("/api/items", item_routes)
        .nest("/api/users", user_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
