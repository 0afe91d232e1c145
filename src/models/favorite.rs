//! Favorite model: one row per (snippet, actor) pair.

use serde::{Deserialize, Serialize};

/// A snippet marked as favorite by an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: String,
    pub snippet_id: String,
    pub actor_id: String,
    pub created_at: String,
}

/// Request body for favoriting a snippet.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRequest {
    pub snippet_id: String,
}

/// Favorited state of a snippet for the current actor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteStatus {
    pub snippet_id: String,
    pub is_favorited: bool,
}
