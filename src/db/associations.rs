//! Association store: tags, snippet/tag links and favorites.
//!
//! Link rows are only ever changed through these functions. Favorite inserts
//! rely on the `(snippet_id, actor_id)` unique constraint with conflict-ignore,
//! never on a read-then-write check.

use std::collections::HashSet;

use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

use super::now_timestamp;
use super::repository::{
    bump_revision, load_view, missing_reference, tag_from_row, touch_snippet, Repository,
};
use crate::errors::AppError;
use crate::models::{
    normalize_tag_name, CreateTagRequest, Favorite, SnippetView, Tag, UpdateTagRequest,
    DEFAULT_TAG_COLOR,
};

/// Replace every tag link of a snippet. Runs inside the caller's transaction,
/// so readers see the old set or the new set and nothing in between.
pub(super) async fn replace_tags(
    conn: &mut SqliteConnection,
    snippet_id: &str,
    tag_ids: &[String],
    now: &str,
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM snippet_tags WHERE snippet_id = ?")
        .bind(snippet_id)
        .execute(&mut *conn)
        .await?;

    let mut seen = HashSet::new();
    for tag_id in tag_ids.iter().filter(|id| seen.insert(id.as_str())) {
        sqlx::query("INSERT INTO snippet_tags (snippet_id, tag_id, created_at) VALUES (?, ?, ?)")
            .bind(snippet_id)
            .bind(tag_id)
            .bind(now)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                missing_reference(e, || {
                    AppError::Validation(format!("Tag {} does not exist", tag_id))
                })
            })?;
    }

    Ok(())
}

fn favorite_from_row(row: &SqliteRow) -> Favorite {
    Favorite {
        id: row.get("id"),
        snippet_id: row.get("snippet_id"),
        actor_id: row.get("actor_id"),
        created_at: row.get("created_at"),
    }
}

fn tag_conflict(err: sqlx::Error, name: &str) -> AppError {
    match err {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::Conflict(format!("Tag {} already exists", name))
        }
        other => other.into(),
    }
}

impl Repository {
    // ==================== TAG OPERATIONS ====================

    /// List all tags.
    pub async fn list_tags(&self) -> Result<Vec<Tag>, AppError> {
        let rows = sqlx::query("SELECT id, name, color, created_at FROM tags ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(tag_from_row).collect())
    }

    /// Get a tag by ID.
    pub async fn get_tag(&self, id: &str) -> Result<Option<Tag>, AppError> {
        let row = sqlx::query("SELECT id, name, color, created_at FROM tags WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(tag_from_row))
    }

    /// Create a new tag. The name is stored trimmed and lower-cased.
    pub async fn create_tag(&self, request: &CreateTagRequest) -> Result<Tag, AppError> {
        let name = normalize_tag_name(&request.name);
        if name.is_empty() {
            return Err(AppError::Validation("Tag name is required".to_string()));
        }

        let tag = Tag {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            color: request
                .color
                .clone()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TAG_COLOR.to_string()),
            created_at: now_timestamp(),
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO tags (id, name, color, created_at) VALUES (?, ?, ?, ?)")
            .bind(&tag.id)
            .bind(&tag.name)
            .bind(&tag.color)
            .bind(&tag.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| tag_conflict(e, &tag.name))?;

        bump_revision(&mut tx).await?;
        tx.commit().await?;

        tracing::debug!(tag_id = %tag.id, name = %tag.name, "Created tag");
        Ok(tag)
    }

    /// Rename or recolor a tag.
    pub async fn update_tag(&self, id: &str, request: &UpdateTagRequest) -> Result<Tag, AppError> {
        let name = request.name.as_deref().map(normalize_tag_name);
        if matches!(name.as_deref(), Some("")) {
            return Err(AppError::Validation("Tag name is required".to_string()));
        }
        // Blank colors keep the current one, as create falls back to the default.
        let color = request
            .color
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE tags SET name = COALESCE(?, name), color = COALESCE(?, color) WHERE id = ?",
        )
        .bind(&name)
        .bind(color)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| tag_conflict(e, name.as_deref().unwrap_or(id)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Tag {} not found", id)));
        }

        bump_revision(&mut tx).await?;

        let row = sqlx::query("SELECT id, name, color, created_at FROM tags WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(tag_from_row(&row))
    }

    /// Delete a tag and its links. Snippets that carried it are kept.
    pub async fn delete_tag(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM snippet_tags WHERE tag_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM tags WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Tag {} not found", id)));
        }

        bump_revision(&mut tx).await?;
        tx.commit().await?;

        tracing::debug!(tag_id = %id, "Deleted tag");
        Ok(())
    }

    // ==================== SNIPPET/TAG LINKS ====================

    /// Replace the full tag set of a snippet. An empty slice clears it.
    pub async fn set_tags(
        &self,
        snippet_id: &str,
        tag_ids: &[String],
    ) -> Result<SnippetView, AppError> {
        let now = now_timestamp();
        let mut tx = self.pool.begin().await?;

        if !touch_snippet(&mut tx, snippet_id, &now).await? {
            return Err(AppError::NotFound(format!("Snippet {} not found", snippet_id)));
        }

        replace_tags(&mut tx, snippet_id, tag_ids, &now).await?;
        bump_revision(&mut tx).await?;

        let view = load_view(&mut tx, snippet_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Snippet {} not found", snippet_id)))?;

        tx.commit().await?;

        tracing::debug!(snippet_id, tags = view.tags.len(), "Replaced snippet tags");
        Ok(view)
    }

    /// Attach one tag to a snippet. Attaching an attached tag is a no-op.
    pub async fn add_tag_to_snippet(
        &self,
        snippet_id: &str,
        tag_id: &str,
    ) -> Result<SnippetView, AppError> {
        let now = now_timestamp();
        let mut tx = self.pool.begin().await?;

        if !touch_snippet(&mut tx, snippet_id, &now).await? {
            return Err(AppError::NotFound(format!("Snippet {} not found", snippet_id)));
        }

        sqlx::query(
            "INSERT INTO snippet_tags (snippet_id, tag_id, created_at) VALUES (?, ?, ?) ON CONFLICT (snippet_id, tag_id) DO NOTHING",
        )
        .bind(snippet_id)
        .bind(tag_id)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| missing_reference(e, || AppError::NotFound(format!("Tag {} not found", tag_id))))?;

        bump_revision(&mut tx).await?;

        let view = load_view(&mut tx, snippet_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Snippet {} not found", snippet_id)))?;

        tx.commit().await?;
        Ok(view)
    }

    /// Detach one tag from a snippet. Detaching an absent tag is a no-op.
    pub async fn remove_tag_from_snippet(
        &self,
        snippet_id: &str,
        tag_id: &str,
    ) -> Result<SnippetView, AppError> {
        let now = now_timestamp();
        let mut tx = self.pool.begin().await?;

        if !touch_snippet(&mut tx, snippet_id, &now).await? {
            return Err(AppError::NotFound(format!("Snippet {} not found", snippet_id)));
        }

        sqlx::query("DELETE FROM snippet_tags WHERE snippet_id = ? AND tag_id = ?")
            .bind(snippet_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;

        bump_revision(&mut tx).await?;

        let view = load_view(&mut tx, snippet_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Snippet {} not found", snippet_id)))?;

        tx.commit().await?;
        Ok(view)
    }

    // ==================== FAVORITES ====================

    /// Favorite a snippet for an actor, returning the existing row if there is one.
    pub async fn favorite(&self, snippet_id: &str, actor_id: &str) -> Result<Favorite, AppError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO favorites (id, snippet_id, actor_id, created_at) VALUES (?, ?, ?, ?) ON CONFLICT (snippet_id, actor_id) DO NOTHING",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(snippet_id)
        .bind(actor_id)
        .bind(now_timestamp())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            missing_reference(e, || {
                AppError::NotFound(format!("Snippet {} not found", snippet_id))
            })
        })?
        .rows_affected()
            > 0;

        if inserted {
            bump_revision(&mut tx).await?;
        }

        let row = sqlx::query(
            "SELECT id, snippet_id, actor_id, created_at FROM favorites WHERE snippet_id = ? AND actor_id = ?",
        )
        .bind(snippet_id)
        .bind(actor_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(snippet_id, actor_id, inserted, "Favorited snippet");
        Ok(favorite_from_row(&row))
    }

    /// Remove an actor's favorite. Absent favorites are not an error.
    pub async fn unfavorite(&self, snippet_id: &str, actor_id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM favorites WHERE snippet_id = ? AND actor_id = ?")
            .bind(snippet_id)
            .bind(actor_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if removed {
            bump_revision(&mut tx).await?;
        }

        tx.commit().await?;

        tracing::debug!(snippet_id, actor_id, removed, "Unfavorited snippet");
        Ok(())
    }

    /// Flip the favorite state in one transaction and return the new state.
    pub async fn toggle_favorite(&self, snippet_id: &str, actor_id: &str) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM favorites WHERE snippet_id = ? AND actor_id = ?")
            .bind(snippet_id)
            .bind(actor_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if !removed {
            sqlx::query(
                "INSERT INTO favorites (id, snippet_id, actor_id, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(snippet_id)
            .bind(actor_id)
            .bind(now_timestamp())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                missing_reference(e, || {
                    AppError::NotFound(format!("Snippet {} not found", snippet_id))
                })
            })?;
        }

        bump_revision(&mut tx).await?;
        tx.commit().await?;

        Ok(!removed)
    }

    /// Whether the actor has favorited the snippet.
    pub async fn is_favorited(&self, snippet_id: &str, actor_id: &str) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM favorites WHERE snippet_id = ? AND actor_id = ?",
        )
        .bind(snippet_id)
        .bind(actor_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }
}
