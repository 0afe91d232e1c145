//! Favorite API endpoints. Every call acts as the configured actor.

use axum::extract::{Path, Query, State};

use super::{error, success, ApiJson, ApiResult};
use crate::db::ListScope;
use crate::filter::{filter, FilterQuery};
use crate::models::{Favorite, FavoriteRequest, FavoriteStatus, SnippetView};
use crate::AppState;

/// GET /api/favorites - The actor's favorites, most recently favorited first.
pub async fn list_favorites(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<Vec<SnippetView>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let scope = ListScope::FavoritesOf(state.config.actor_id.clone());

    match state.repo.list_snippets(&scope).await {
        Ok(views) => success(filter(views, &query.into()), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/favorites - Favorite a snippet. Repeating the call is harmless.
pub async fn add_favorite(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<FavoriteRequest>,
) -> ApiResult<Favorite> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state
        .repo
        .favorite(&request.snippet_id, &state.config.actor_id)
        .await
    {
        Ok(favorite) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(favorite, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/favorites/{snippet_id} - Unfavorite a snippet.
pub async fn remove_favorite(
    State(state): State<AppState>,
    Path(snippet_id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state
        .repo
        .unfavorite(&snippet_id, &state.config.actor_id)
        .await
    {
        Ok(()) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/favorites/{snippet_id} - Whether the actor favorited a snippet.
pub async fn get_favorite_status(
    State(state): State<AppState>,
    Path(snippet_id): Path<String>,
) -> ApiResult<FavoriteStatus> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state
        .repo
        .is_favorited(&snippet_id, &state.config.actor_id)
        .await
    {
        Ok(is_favorited) => success(
            FavoriteStatus {
                snippet_id,
                is_favorited,
            },
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/favorites/{snippet_id}/toggle - Flip the favorite state.
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Path(snippet_id): Path<String>,
) -> ApiResult<FavoriteStatus> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state
        .repo
        .toggle_favorite(&snippet_id, &state.config.actor_id)
        .await
    {
        Ok(is_favorited) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(
                FavoriteStatus {
                    snippet_id,
                    is_favorited,
                },
                new_revision,
            )
        }
        Err(e) => error(e, revision_id),
    }
}
