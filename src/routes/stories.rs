// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Story routes for authenticated users.

use crate::dto::{SaveStoryDto, StoryDto};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::services::ensure_owner;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

const MAX_PAGE_SIZE: u32 = 100;

/// Story routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stories", get(list_stories).post(create_story))
        .route(
            "/stories/{id}",
            get(get_story).put(update_story).delete(remove_story),
        )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoriesQuery {
    /// Zero-based page number
    page: u32,
    /// Items per page
    page_size: u32,
}

fn validate_page(params: &StoriesQuery) -> Result<()> {
    if params.page_size == 0 || params.page_size > MAX_PAGE_SIZE {
        return Err(AppError::BadRequest(format!(
            "pageSize must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }

    params
        .page
        .checked_mul(params.page_size)
        .map(|_| ())
        .ok_or_else(|| AppError::BadRequest("Page number causes overflow".to_string()))
}

fn validate_body(story: &SaveStoryDto) -> Result<()> {
    story
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

/// List the caller's stories, one page at a time.
async fn list_stories(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<StoriesQuery>,
) -> Result<Json<Vec<StoryDto>>> {
    validate_page(&params)?;

    let stories = state
        .story_service
        .find_by_user_id(user.user_id, params.page, params.page_size)
        .await?;

    Ok(Json(stories))
}

/// Create a story owned by the caller.
async fn create_story(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(story): Json<SaveStoryDto>,
) -> Result<Json<StoryDto>> {
    validate_body(&story)?;

    let created = state.story_service.create(user.user_id, &story).await?;
    Ok(Json(created))
}

/// Get one of the caller's stories.
async fn get_story(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(story_id): Path<u64>,
) -> Result<Json<StoryDto>> {
    let story = state.story_service.load(story_id).await?;
    ensure_owner(user.user_id, &story)?;

    Ok(Json(state.story_service.view(story)?))
}

/// Replace title and activities of one of the caller's stories.
async fn update_story(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(story_id): Path<u64>,
    Json(story): Json<SaveStoryDto>,
) -> Result<Json<StoryDto>> {
    let existing = state.story_service.load(story_id).await?;
    ensure_owner(user.user_id, &existing)?;
    validate_body(&story)?;

    let updated = state.story_service.replace(&existing, &story).await?;
    Ok(Json(updated))
}

/// Delete one of the caller's stories.
async fn remove_story(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(story_id): Path<u64>,
) -> Result<()> {
    let existing = state.story_service.load(story_id).await?;
    ensure_owner(user.user_id, &existing)?;

    state.story_service.remove(story_id).await
}
