//! Read-side projection: snippets + tag links + favorite ids -> views.
//!
//! The three inputs come from independently owned tables and are joined here on
//! every read. Nothing derived is ever written back to `snippets`.

use std::collections::{HashMap, HashSet};

use crate::models::{Snippet, SnippetView, Tag};

/// One row of `snippet_tags` joined with its tag.
#[derive(Debug, Clone)]
pub struct TagLink {
    pub snippet_id: String,
    pub tag: Tag,
}

/// Assemble views in the order of `snippets`.
///
/// Tags keep the order of `links`. A snippet with no links gets an empty list.
pub fn project(
    snippets: Vec<Snippet>,
    links: Vec<TagLink>,
    favorited: &HashSet<String>,
) -> Vec<SnippetView> {
    let mut tags_by_snippet: HashMap<String, Vec<Tag>> = HashMap::new();
    for link in links {
        tags_by_snippet
            .entry(link.snippet_id)
            .or_default()
            .push(link.tag);
    }

    snippets
        .into_iter()
        .map(|snippet| {
            let tags = tags_by_snippet.remove(&snippet.id).unwrap_or_default();
            let is_favorited = favorited.contains(&snippet.id);
            SnippetView {
                snippet,
                tags,
                is_favorited,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snippet(id: &str) -> Snippet {
        Snippet {
            id: id.to_string(),
            title: id.to_string(),
            content: "x".to_string(),
            language: "rust".to_string(),
            is_public: false,
            slug: format!("{id}-000000"),
            created_at: "2024-01-01T00:00:00.000000Z".to_string(),
            updated_at: "2024-01-01T00:00:00.000000Z".to_string(),
        }
    }

    fn link(snippet_id: &str, tag_id: &str) -> TagLink {
        TagLink {
            snippet_id: snippet_id.to_string(),
            tag: Tag {
                id: tag_id.to_string(),
                name: tag_id.to_string(),
                color: "#6366f1".to_string(),
                created_at: "2024-01-01T00:00:00.000000Z".to_string(),
            },
        }
    }

    #[test]
    fn test_project_groups_tags_and_flags_favorites() {
        let snippets = vec![snippet("b"), snippet("a"), snippet("c")];
        let links = vec![link("a", "react"), link("b", "go"), link("a", "frontend")];
        let favorited: HashSet<String> = ["a".to_string()].into_iter().collect();

        let views = project(snippets, links, &favorited);

        let order: Vec<_> = views.iter().map(|v| v.snippet.id.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c"]);

        let a_tags: Vec<_> = views[1].tags.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(a_tags, vec!["react", "frontend"]);
        assert!(views[1].is_favorited);

        assert_eq!(views[0].tags.len(), 1);
        assert!(!views[0].is_favorited);

        assert!(views[2].tags.is_empty());
    }

    #[test]
    fn test_project_ignores_links_for_unlisted_snippets() {
        let views = project(
            vec![snippet("a")],
            vec![link("zzz", "orphan")],
            &HashSet::new(),
        );
        assert_eq!(views.len(), 1);
        assert!(views[0].tags.is_empty());
    }
}
