//! Snippet model and its denormalized read view.

use serde::{de, Deserialize, Deserializer, Serialize};

use super::Tag;

/// Language preselected by the client editor.
pub const DEFAULT_LANGUAGE: &str = "javascript";

/// Languages the client offers. Not enforced by the store.
pub const KNOWN_LANGUAGES: &[&str] = &[
    "javascript",
    "typescript",
    "python",
    "java",
    "c",
    "cpp",
    "csharp",
    "go",
    "rust",
    "php",
    "ruby",
    "swift",
    "kotlin",
    "scala",
    "html",
    "css",
    "sql",
    "bash",
    "powershell",
    "json",
    "yaml",
    "xml",
];

/// A stored code snippet. `id` and `slug` never change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub id: String,
    pub title: String,
    pub content: String,
    pub language: String,
    pub is_public: bool,
    pub slug: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A snippet enriched at read time with its tags and favorited flag.
///
/// Built fresh by the repository on every read; nothing here is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetView {
    #[serde(flatten)]
    pub snippet: Snippet,
    pub tags: Vec<Tag>,
    pub is_favorited: bool,
}

impl SnippetView {
    /// Whether the snippet carries the tag with the given id.
    pub fn has_tag(&self, tag_id: &str) -> bool {
        self.tags.iter().any(|t| t.id == tag_id)
    }
}

/// Request body for creating a new snippet.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSnippetRequest {
    pub title: String,
    pub content: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub tag_ids: Vec<String>,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

/// Request body for a partial snippet update.
///
/// `tag_ids: None` leaves the associations untouched; `Some(vec![])` clears them.
/// An explicit `"tagIds": null` is rejected rather than read as absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSnippetRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default, deserialize_with = "present_tag_ids")]
    pub tag_ids: Option<Vec<String>>,
}

// Only runs when the field is present, so `None` here means a literal null.
fn present_tag_ids<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Vec<String>>::deserialize(deserializer)? {
        Some(ids) => Ok(Some(ids)),
        None => Err(de::Error::custom(
            "tagIds must be an array; omit it to keep the current tags",
        )),
    }
}

/// Request body for replacing a snippet's tag set.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTagsRequest {
    pub tag_ids: Vec<String>,
}
