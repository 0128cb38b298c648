//! Item endpoints. Items carry a category reference, so reads can
//! eagerly attach both the group and the category.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use trolley_core::models::item::{CreateItem, Item, UpdateItem};
use trolley_core::repository::{ChildRepository, ItemIncludes};
use trolley_core::scope::Requirement;

use crate::error::ApiResult;
use crate::query::{self, Params};
use crate::state::AppState;

fn includes(params: &Params) -> ItemIncludes {
    ItemIncludes {
        group: query::flag(params, "withGroup"),
        category: query::flag(params, "withCategory"),
    }
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group_id): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult<Json<Vec<Item>>> {
    let group_id = query::parse_id("groupId", &group_id)?;
    state
        .gate
        .authorize(&headers, Some(group_id), Requirement::Regular)
        .await?;
    let mut options = query::match_options(&params)?;
    options.includes = includes(&params);
    Ok(Json(state.items.all(group_id, &options).await?))
}

pub async fn exact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((group_id, name)): Path<(String, String)>,
    Query(params): Query<Params>,
) -> ApiResult<Json<Item>> {
    let group_id = query::parse_id("groupId", &group_id)?;
    state
        .gate
        .authorize(&headers, Some(group_id), Requirement::Regular)
        .await?;
    let item = state.items.exact(group_id, &name, &includes(&params)).await?;
    Ok(Json(item))
}

pub async fn find(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((group_id, item_id)): Path<(String, String)>,
    Query(params): Query<Params>,
) -> ApiResult<Json<Item>> {
    let group_id = query::parse_id("groupId", &group_id)?;
    let item_id = query::parse_id("itemId", &item_id)?;
    state
        .gate
        .authorize(&headers, Some(group_id), Requirement::Regular)
        .await?;
    let item = state
        .items
        .find(group_id, item_id, &includes(&params))
        .await?;
    Ok(Json(item))
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group_id): Path<String>,
    Json(input): Json<CreateItem>,
) -> ApiResult<(StatusCode, Json<Item>)> {
    let group_id = query::parse_id("groupId", &group_id)?;
    state
        .gate
        .authorize(&headers, Some(group_id), Requirement::Admin)
        .await?;
    let item = state.items.insert(group_id, input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((group_id, item_id)): Path<(String, String)>,
    Json(input): Json<UpdateItem>,
) -> ApiResult<Json<Item>> {
    let group_id = query::parse_id("groupId", &group_id)?;
    let item_id = query::parse_id("itemId", &item_id)?;
    state
        .gate
        .authorize(&headers, Some(group_id), Requirement::Admin)
        .await?;
    let item = state.items.update(group_id, item_id, input).await?;
    Ok(Json(item))
}

pub async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((group_id, item_id)): Path<(String, String)>,
) -> ApiResult<Json<Item>> {
    let group_id = query::parse_id("groupId", &group_id)?;
    let item_id = query::parse_id("itemId", &item_id)?;
    state
        .gate
        .authorize(&headers, Some(group_id), Requirement::Admin)
        .await?;
    let item = state.items.remove(group_id, item_id).await?;
    Ok(Json(item))
}
