//! Tag model.

use serde::{Deserialize, Serialize};

/// Color given to tags created without one.
pub const DEFAULT_TAG_COLOR: &str = "#6366f1";

/// A reusable label attached to snippets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub color: String,
    pub created_at: String,
}

/// Request body for creating a new tag.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTagRequest {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// Request body for updating an existing tag.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTagRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Canonical form of a tag name: trimmed and lower-cased.
pub fn normalize_tag_name(name: &str) -> String {
    name.trim().to_lowercase()
}
