//! Group endpoints.
//!
//! Listing and exact-name lookup are open to anonymous callers; a
//! direct read needs regular access to that group. Creation and
//! removal are superuser operations, updates need group admin.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use trolley_core::models::category::Category;
use trolley_core::models::group::{CreateGroup, Group, UpdateGroup};
use trolley_core::models::item::Item;
use trolley_core::models::list::List;
use trolley_core::repository::{
    CategoryIncludes, GroupIncludes, GroupRepository, ItemIncludes, ListIncludes,
    ParentRepository,
};
use trolley_core::scope::Requirement;

use crate::error::ApiResult;
use crate::query::{self, Params};
use crate::state::AppState;

fn includes(params: &Params) -> GroupIncludes {
    GroupIncludes {
        categories: query::flag(params, "withCategories"),
        items: query::flag(params, "withItems"),
        lists: query::flag(params, "withLists"),
    }
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<Params>,
) -> ApiResult<Json<Vec<Group>>> {
    state.gate.authorize(&headers, None, Requirement::Any).await?;
    let mut options = query::match_options(&params)?;
    options.includes = includes(&params);
    Ok(Json(state.groups.all(&options).await?))
}

pub async fn exact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult<Json<Group>> {
    state.gate.authorize(&headers, None, Requirement::Any).await?;
    Ok(Json(state.groups.exact(&name, &includes(&params)).await?))
}

pub async fn find(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group_id): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult<Json<Group>> {
    let group_id = query::parse_id("groupId", &group_id)?;
    state
        .gate
        .authorize(&headers, Some(group_id), Requirement::Regular)
        .await?;
    Ok(Json(state.groups.find(group_id, &includes(&params)).await?))
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateGroup>,
) -> ApiResult<(StatusCode, Json<Group>)> {
    state
        .gate
        .authorize(&headers, None, Requirement::Superuser)
        .await?;
    let group = state.groups.insert(input).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group_id): Path<String>,
    Json(input): Json<UpdateGroup>,
) -> ApiResult<Json<Group>> {
    let group_id = query::parse_id("groupId", &group_id)?;
    state
        .gate
        .authorize(&headers, Some(group_id), Requirement::Admin)
        .await?;
    let group = state.groups.update(group_id, input).await?;
    // The scope may have changed; drop the cached copy before replying.
    state.cache.invalidate(group_id).await;
    Ok(Json(group))
}

pub async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group_id): Path<String>,
) -> ApiResult<Json<Group>> {
    state
        .gate
        .authorize(&headers, None, Requirement::Superuser)
        .await?;
    let group_id = query::parse_id("groupId", &group_id)?;
    let group = state.groups.remove(group_id).await?;
    state.cache.invalidate(group_id).await;
    Ok(Json(group))
}

pub async fn categories(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group_id): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult<Json<Vec<Category>>> {
    let group_id = query::parse_id("groupId", &group_id)?;
    state
        .gate
        .authorize(&headers, Some(group_id), Requirement::Regular)
        .await?;
    let mut options = query::match_options(&params)?;
    options.includes = CategoryIncludes {
        group: query::flag(&params, "withGroup"),
    };
    Ok(Json(state.groups.categories(group_id, &options).await?))
}

pub async fn items(
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
    options.includes = ItemIncludes {
        group: query::flag(&params, "withGroup"),
        category: query::flag(&params, "withCategory"),
    };
    Ok(Json(state.groups.items(group_id, &options).await?))
}

pub async fn lists(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group_id): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult<Json<Vec<List>>> {
    let group_id = query::parse_id("groupId", &group_id)?;
    state
        .gate
        .authorize(&headers, Some(group_id), Requirement::Regular)
        .await?;
    let mut options = query::match_options(&params)?;
    options.includes = ListIncludes {
        group: query::flag(&params, "withGroup"),
    };
    Ok(Json(state.groups.lists(group_id, &options).await?))
}
