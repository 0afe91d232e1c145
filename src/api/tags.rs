//! Tag API endpoints.

use axum::extract::{Path, State};

use super::{error, success, ApiJson, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateTagRequest, Tag, UpdateTagRequest};
use crate::AppState;

/// GET /api/tags - List all tags.
pub async fn list_tags(State(state): State<AppState>) -> ApiResult<Vec<Tag>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_tags().await {
        Ok(tags) => success(tags, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/tags/{id} - Get a single tag.
pub async fn get_tag(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Tag> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_tag(&id).await {
        Ok(Some(tag)) => success(tag, revision_id),
        Ok(None) => error(AppError::NotFound(format!("Tag {} not found", id)), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/tags - Create a new tag.
pub async fn create_tag(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateTagRequest>,
) -> ApiResult<Tag> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.create_tag(&request).await {
        Ok(tag) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(tag, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/tags/{id} - Update a tag.
pub async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateTagRequest>,
) -> ApiResult<Tag> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.update_tag(&id, &request).await {
        Ok(tag) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(tag, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/tags/{id} - Delete a tag. Snippets keep existing without it.
pub async fn delete_tag(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_tag(&id).await {
        Ok(()) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
