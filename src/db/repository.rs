//! Database repository for snippet CRUD and denormalized reads.
//!
//! Multi-row writes run in one transaction that opens with a write statement.
//! Reads that assemble views run in one transaction so every table is seen
//! at the same snapshot.

use std::collections::HashSet;

use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Row, SqlitePool};

use super::associations::replace_tags;
use super::projection::{project, TagLink};
use super::now_timestamp;
use crate::errors::AppError;
use crate::models::{
    CreateSnippetRequest, RevisionInfo, Snippet, SnippetView, Tag, UpdateSnippetRequest,
};
use crate::slug::generate_slug;

const SNIPPET_COLUMNS: &str =
    "s.id, s.title, s.content, s.language, s.is_public, s.slug, s.created_at, s.updated_at";

const LINK_COLUMNS: &str = "st.snippet_id, t.id, t.name, t.color, t.created_at";

/// Which snippets a list read returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
    /// Every snippet, newest first. `is_favorited` means favorited by anyone.
    All,
    /// Snippets the actor favorited, most recently favorited first.
    FavoritesOf(String),
}

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pub(super) pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Check that the store answers.
    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Get revision info.
    pub async fn get_revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }

    // ==================== SNIPPET READS ====================

    /// List snippets in the given scope as denormalized views.
    pub async fn list_snippets(&self, scope: &ListScope) -> Result<Vec<SnippetView>, AppError> {
        let mut tx = self.pool.begin().await?;

        let snippets = fetch_snippets(&mut tx, scope).await?;
        let links = fetch_links(&mut tx, scope).await?;
        let favorited = fetch_favorited(&mut tx, scope).await?;

        tx.commit().await?;

        Ok(project(snippets, links, &favorited))
    }

    /// Get one snippet as a denormalized view.
    pub async fn get_snippet(&self, id: &str) -> Result<Option<SnippetView>, AppError> {
        let mut tx = self.pool.begin().await?;
        let view = load_view(&mut tx, id).await?;
        tx.commit().await?;
        Ok(view)
    }

    // ==================== SNIPPET WRITES ====================

    /// Create a snippet and its tag associations.
    pub async fn create_snippet(
        &self,
        request: &CreateSnippetRequest,
    ) -> Result<SnippetView, AppError> {
        let slug = generate_slug(&request.title);
        self.create_snippet_with_slug(request, &slug).await
    }

    pub(crate) async fn create_snippet_with_slug(
        &self,
        request: &CreateSnippetRequest,
        slug: &str,
    ) -> Result<SnippetView, AppError> {
        require_text("Title", &request.title)?;
        require_text("Content", &request.content)?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = now_timestamp();

        // Snippet row and tag rows commit together or not at all.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO snippets (id, title, content, language, is_public, slug, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(request.title.trim())
        .bind(&request.content)
        .bind(&request.language)
        .bind(request.is_public as i32)
        .bind(slug)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict(format!("Slug {} is already taken", slug))
            }
            other => other.into(),
        })?;

        replace_tags(&mut tx, &id, &request.tag_ids, &now).await?;
        bump_revision(&mut tx).await?;

        let view = load_view(&mut tx, &id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Snippet {} vanished during create", id)))?;

        tx.commit().await?;

        tracing::debug!(snippet_id = %id, slug, tags = view.tags.len(), "Created snippet");
        Ok(view)
    }

    /// Apply a partial update. Tags are replaced only when `tag_ids` is present.
    pub async fn update_snippet(
        &self,
        id: &str,
        request: &UpdateSnippetRequest,
    ) -> Result<SnippetView, AppError> {
        if let Some(title) = &request.title {
            require_text("Title", title)?;
        }
        if let Some(content) = &request.content {
            require_text("Content", content)?;
        }

        let now = now_timestamp();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"UPDATE snippets SET
                title = COALESCE(?, title),
                content = COALESCE(?, content),
                language = COALESCE(?, language),
                is_public = COALESCE(?, is_public),
                updated_at = ?
            WHERE id = ?"#,
        )
        .bind(request.title.as_deref().map(str::trim))
        .bind(&request.content)
        .bind(&request.language)
        .bind(request.is_public.map(|b| b as i32))
        .bind(&now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Snippet {} not found", id)));
        }

        if let Some(tag_ids) = &request.tag_ids {
            replace_tags(&mut tx, id, tag_ids, &now).await?;
        }

        bump_revision(&mut tx).await?;

        let view = load_view(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Snippet {} not found", id)))?;

        tx.commit().await?;

        tracing::debug!(
            snippet_id = %id,
            tags_replaced = request.tag_ids.is_some(),
            "Updated snippet"
        );
        Ok(view)
    }

    /// Delete a snippet together with its tag associations and favorites.
    pub async fn delete_snippet(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM snippet_tags WHERE snippet_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM favorites WHERE snippet_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM snippets WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Snippet {} not found", id)));
        }

        bump_revision(&mut tx).await?;
        tx.commit().await?;

        tracing::debug!(snippet_id = %id, "Deleted snippet");
        Ok(())
    }
}

// Helpers shared with the association store

/// Reject empty or whitespace-only required text.
fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Increment the revision counter inside the caller's transaction.
pub(super) async fn bump_revision(conn: &mut SqliteConnection) -> Result<(), AppError> {
    sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
        .bind(now_timestamp())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Refresh `updated_at`. Returns false when the snippet does not exist.
pub(super) async fn touch_snippet(
    conn: &mut SqliteConnection,
    id: &str,
    now: &str,
) -> Result<bool, AppError> {
    let result = sqlx::query("UPDATE snippets SET updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Map a foreign-key failure to `on_missing`, anything else the usual way.
pub(super) fn missing_reference(err: sqlx::Error, on_missing: impl FnOnce() -> AppError) -> AppError {
    if AppError::is_missing_reference(&err) {
        on_missing()
    } else {
        err.into()
    }
}

/// Build the view of one snippet. `is_favorited` considers every actor.
pub(super) async fn load_view(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<SnippetView>, AppError> {
    let sql = format!("SELECT {} FROM snippets s WHERE s.id = ?", SNIPPET_COLUMNS);
    let Some(row) = sqlx::query(&sql).bind(id).fetch_optional(&mut *conn).await? else {
        return Ok(None);
    };
    let snippet = snippet_from_row(&row);

    let sql = format!(
        "SELECT {} FROM snippet_tags st JOIN tags t ON t.id = st.tag_id WHERE st.snippet_id = ? ORDER BY t.name",
        LINK_COLUMNS
    );
    let links = sqlx::query(&sql)
        .bind(id)
        .fetch_all(&mut *conn)
        .await?
        .iter()
        .map(link_from_row)
        .collect();

    let favorite_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM favorites WHERE snippet_id = ?")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
    let favorited: HashSet<String> = if favorite_count > 0 {
        HashSet::from([id.to_string()])
    } else {
        HashSet::new()
    };

    Ok(project(vec![snippet], links, &favorited).pop())
}

async fn fetch_snippets(
    conn: &mut SqliteConnection,
    scope: &ListScope,
) -> Result<Vec<Snippet>, AppError> {
    let rows = match scope {
        ListScope::All => {
            let sql = format!(
                "SELECT {} FROM snippets s ORDER BY s.created_at DESC, s.rowid DESC",
                SNIPPET_COLUMNS
            );
            sqlx::query(&sql).fetch_all(&mut *conn).await?
        }
        ListScope::FavoritesOf(actor_id) => {
            let sql = format!(
                "SELECT {} FROM favorites f JOIN snippets s ON s.id = f.snippet_id WHERE f.actor_id = ? ORDER BY f.created_at DESC, f.rowid DESC",
                SNIPPET_COLUMNS
            );
            sqlx::query(&sql)
                .bind(actor_id)
                .fetch_all(&mut *conn)
                .await?
        }
    };

    Ok(rows.iter().map(snippet_from_row).collect())
}

async fn fetch_links(
    conn: &mut SqliteConnection,
    scope: &ListScope,
) -> Result<Vec<TagLink>, AppError> {
    let rows = match scope {
        ListScope::All => {
            let sql = format!(
                "SELECT {} FROM snippet_tags st JOIN tags t ON t.id = st.tag_id ORDER BY t.name",
                LINK_COLUMNS
            );
            sqlx::query(&sql).fetch_all(&mut *conn).await?
        }
        ListScope::FavoritesOf(actor_id) => {
            let sql = format!(
                "SELECT {} FROM snippet_tags st JOIN tags t ON t.id = st.tag_id WHERE st.snippet_id IN (SELECT snippet_id FROM favorites WHERE actor_id = ?) ORDER BY t.name",
                LINK_COLUMNS
            );
            sqlx::query(&sql)
                .bind(actor_id)
                .fetch_all(&mut *conn)
                .await?
        }
    };

    Ok(rows.iter().map(link_from_row).collect())
}

async fn fetch_favorited(
    conn: &mut SqliteConnection,
    scope: &ListScope,
) -> Result<HashSet<String>, AppError> {
    let ids: Vec<String> = match scope {
        ListScope::All => {
            sqlx::query_scalar("SELECT DISTINCT snippet_id FROM favorites")
                .fetch_all(&mut *conn)
                .await?
        }
        ListScope::FavoritesOf(actor_id) => {
            sqlx::query_scalar("SELECT snippet_id FROM favorites WHERE actor_id = ?")
                .bind(actor_id)
                .fetch_all(&mut *conn)
                .await?
        }
    };

    Ok(ids.into_iter().collect())
}

// Helper functions for row conversion

fn snippet_from_row(row: &SqliteRow) -> Snippet {
    let is_public: i32 = row.get("is_public");
    Snippet {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        language: row.get("language"),
        is_public: is_public != 0,
        slug: row.get("slug"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn link_from_row(row: &SqliteRow) -> TagLink {
    TagLink {
        snippet_id: row.get("snippet_id"),
        tag: tag_from_row(row),
    }
}

pub(super) fn tag_from_row(row: &SqliteRow) -> Tag {
    Tag {
        id: row.get("id"),
        name: row.get("name"),
        color: row.get("color"),
        created_at: row.get("created_at"),
    }
}
