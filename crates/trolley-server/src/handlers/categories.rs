//! Category endpoints. Reads need regular access to the owning
//! group, mutations need admin.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use trolley_core::models::category::{Category, CreateCategory, UpdateCategory};
use trolley_core::repository::{CategoryIncludes, ChildRepository};
use trolley_core::scope::Requirement;

use crate::error::ApiResult;
use crate::query::{self, Params};
use crate::state::AppState;

fn includes(params: &Params) -> CategoryIncludes {
    CategoryIncludes {
        group: query::flag(params, "withGroup"),
    }
}

pub async fn list(
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
    options.includes = includes(&params);
    Ok(Json(state.categories.all(group_id, &options).await?))
}

pub async fn exact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((group_id, name)): Path<(String, String)>,
    Query(params): Query<Params>,
) -> ApiResult<Json<Category>> {
    let group_id = query::parse_id("groupId", &group_id)?;
    state
        .gate
        .authorize(&headers, Some(group_id), Requirement::Regular)
        .await?;
    let category = state
        .categories
        .exact(group_id, &name, &includes(&params))
        .await?;
    Ok(Json(category))
}

pub async fn find(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((group_id, category_id)): Path<(String, String)>,
    Query(params): Query<Params>,
) -> ApiResult<Json<Category>> {
    let group_id = query::parse_id("groupId", &group_id)?;
    let category_id = query::parse_id("categoryId", &category_id)?;
    state
        .gate
        .authorize(&headers, Some(group_id), Requirement::Regular)
        .await?;
    let category = state
        .categories
        .find(group_id, category_id, &includes(&params))
        .await?;
    Ok(Json(category))
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group_id): Path<String>,
    Json(input): Json<CreateCategory>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let group_id = query::parse_id("groupId", &group_id)?;
    state
        .gate
        .authorize(&headers, Some(group_id), Requirement::Admin)
        .await?;
    let category = state.categories.insert(group_id, input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((group_id, category_id)): Path<(String, String)>,
    Json(input): Json<UpdateCategory>,
) -> ApiResult<Json<Category>> {
    let group_id = query::parse_id("groupId", &group_id)?;
    let category_id = query::parse_id("categoryId", &category_id)?;
    state
        .gate
        .authorize(&headers, Some(group_id), Requirement::Admin)
        .await?;
    let category = state.categories.update(group_id, category_id, input).await?;
    Ok(Json(category))
}

pub async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((group_id, category_id)): Path<(String, String)>,
) -> ApiResult<Json<Category>> {
    let group_id = query::parse_id("groupId", &group_id)?;
    let category_id = query::parse_id("categoryId", &category_id)?;
    state
        .gate
        .authorize(&headers, Some(group_id), Requirement::Admin)
        .await?;
    let category = state.categories.remove(group_id, category_id).await?;
    Ok(Json(category))
}
