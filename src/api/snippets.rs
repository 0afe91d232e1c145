//! Snippet API endpoints.

use axum::extract::{Path, Query, State};
use serde::Serialize;

use super::{error, success, ApiJson, ApiResult};
use crate::db::ListScope;
use crate::errors::AppError;
use crate::filter::{available_languages, available_tags, filter, FilterQuery};
use crate::models::{
    CreateSnippetRequest, SetTagsRequest, SnippetView, Tag, UpdateSnippetRequest,
};
use crate::AppState;

/// Filter dropdown sources.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Facets {
    pub languages: Vec<String>,
    pub tags: Vec<Tag>,
}

/// GET /api/snippets - List all snippets, optionally filtered.
pub async fn list_snippets(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<Vec<SnippetView>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_snippets(&ListScope::All).await {
        Ok(views) => success(filter(views, &query.into()), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/snippets/{id} - Get a single snippet.
pub async fn get_snippet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<SnippetView> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_snippet(&id).await {
        Ok(Some(view)) => success(view, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Snippet {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/snippets - Create a new snippet.
pub async fn create_snippet(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateSnippetRequest>,
) -> ApiResult<SnippetView> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.create_snippet(&request).await {
        Ok(view) => {
            tracing::info!("Created snippet {} ({})", view.snippet.id, view.snippet.slug);
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(view, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/snippets/{id} - Update a snippet.
pub async fn update_snippet(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateSnippetRequest>,
) -> ApiResult<SnippetView> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.update_snippet(&id, &request).await {
        Ok(view) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(view, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/snippets/{id} - Delete a snippet and its associations.
pub async fn delete_snippet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_snippet(&id).await {
        Ok(()) => {
            tracing::info!("Deleted snippet {}", id);
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/snippets/{id}/tags - Replace the snippet's tag set.
pub async fn set_snippet_tags(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<SetTagsRequest>,
) -> ApiResult<SnippetView> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.set_tags(&id, &request.tag_ids).await {
        Ok(view) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(view, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/snippets/{id}/tags/{tag_id} - Attach one tag.
pub async fn add_snippet_tag(
    State(state): State<AppState>,
    Path((id, tag_id)): Path<(String, String)>,
) -> ApiResult<SnippetView> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.add_tag_to_snippet(&id, &tag_id).await {
        Ok(view) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(view, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/snippets/{id}/tags/{tag_id} - Detach one tag.
pub async fn remove_snippet_tag(
    State(state): State<AppState>,
    Path((id, tag_id)): Path<(String, String)>,
) -> ApiResult<SnippetView> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.remove_tag_from_snippet(&id, &tag_id).await {
        Ok(view) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(view, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/facets - Languages and tags that at least one snippet uses.
pub async fn get_facets(State(state): State<AppState>) -> ApiResult<Facets> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let views = match state.repo.list_snippets(&ListScope::All).await {
        Ok(views) => views,
        Err(e) => return error(e, revision_id),
    };
    let tags = match state.repo.list_tags().await {
        Ok(tags) => tags,
        Err(e) => return error(e, revision_id),
    };

    success(
        Facets {
            languages: available_languages(&views),
            tags: available_tags(&views, &tags),
        },
        revision_id,
    )
}
