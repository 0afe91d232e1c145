//! Client-side filtering over denormalized snippet views.
//!
//! Everything here is pure: the caller fetches the views, this module only
//! decides which ones are visible and which facet values are worth offering.

use std::collections::HashSet;

use serde::Deserialize;

use crate::models::{SnippetView, Tag, KNOWN_LANGUAGES};

/// Current filter selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    /// Case-insensitive substring matched against title or content.
    pub search_text: String,
    /// Exact language; empty means any.
    pub language: String,
    /// Every listed tag must be on the snippet; empty means any.
    pub tag_ids: Vec<String>,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        self.search_text.is_empty() && self.language.is_empty() && self.tag_ids.is_empty()
    }

    /// Whether a single view passes all three criteria.
    pub fn matches(&self, view: &SnippetView) -> bool {
        self.matches_search(view) && self.matches_language(view) && self.matches_tags(view)
    }

    fn matches_search(&self, view: &SnippetView) -> bool {
        if self.search_text.is_empty() {
            return true;
        }
        let needle = self.search_text.to_lowercase();
        view.snippet.title.to_lowercase().contains(&needle)
            || view.snippet.content.to_lowercase().contains(&needle)
    }

    fn matches_language(&self, view: &SnippetView) -> bool {
        self.language.is_empty() || view.snippet.language == self.language
    }

    // Conjunctive: the snippet needs all selected tags, not just one.
    fn matches_tags(&self, view: &SnippetView) -> bool {
        self.tag_ids.iter().all(|id| view.has_tag(id))
    }
}

/// Query-string form of [`FilterState`]: `?q=&language=&tags=a,b`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    /// Comma-separated tag ids.
    #[serde(default)]
    pub tags: Option<String>,
}

impl From<FilterQuery> for FilterState {
    fn from(query: FilterQuery) -> Self {
        let tag_ids = query
            .tags
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            search_text: query.q.unwrap_or_default(),
            language: query.language.unwrap_or_default(),
            tag_ids,
        }
    }
}

/// Visible subset of `snippets`, in input order.
pub fn filter(snippets: Vec<SnippetView>, state: &FilterState) -> Vec<SnippetView> {
    if state.is_empty() {
        return snippets;
    }
    snippets.into_iter().filter(|view| state.matches(view)).collect()
}

/// Known languages used by at least one snippet, in canonical order.
pub fn available_languages(snippets: &[SnippetView]) -> Vec<String> {
    let used: HashSet<&str> = snippets
        .iter()
        .map(|view| view.snippet.language.as_str())
        .collect();

    KNOWN_LANGUAGES
        .iter()
        .filter(|lang| used.contains(*lang))
        .map(|lang| lang.to_string())
        .collect()
}

/// Tags attached to at least one snippet, in the order of `tags`.
pub fn available_tags(snippets: &[SnippetView], tags: &[Tag]) -> Vec<Tag> {
    let used: HashSet<&str> = snippets
        .iter()
        .flat_map(|view| view.tags.iter().map(|t| t.id.as_str()))
        .collect();

    tags.iter()
        .filter(|tag| used.contains(tag.id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Snippet;

    fn tag(id: &str) -> Tag {
        Tag {
            id: id.to_string(),
            name: id.to_string(),
            color: "#000000".to_string(),
            created_at: "2024-01-01T00:00:00.000000Z".to_string(),
        }
    }

    fn view(id: &str, title: &str, content: &str, language: &str, tags: &[&str]) -> SnippetView {
        SnippetView {
            snippet: Snippet {
                id: id.to_string(),
                title: title.to_string(),
                content: content.to_string(),
                language: language.to_string(),
                is_public: false,
                slug: format!("{id}-abc123"),
                created_at: "2024-01-01T00:00:00.000000Z".to_string(),
                updated_at: "2024-01-01T00:00:00.000000Z".to_string(),
            },
            tags: tags.iter().map(|t| tag(t)).collect(),
            is_favorited: false,
        }
    }

    fn ids(views: &[SnippetView]) -> Vec<String> {
        views.iter().map(|v| v.snippet.id.clone()).collect()
    }

    fn sample() -> Vec<SnippetView> {
        vec![
            view("A", "Use effect", "useEffect(() => {})", "javascript", &["react", "frontend"]),
            view("B", "Typed props", "interface Props {}", "typescript", &["typescript", "frontend"]),
            view("C", "Hello", "print('hello')", "python", &[]),
        ]
    }

    #[test]
    fn test_empty_state_passes_everything_in_order() {
        let snippets = sample();
        let result = filter(snippets, &FilterState::default());
        assert_eq!(ids(&result), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_tags_are_conjunctive() {
        let snippets = sample();

        let both = FilterState {
            tag_ids: vec!["react".into(), "frontend".into()],
            ..Default::default()
        };
        assert_eq!(ids(&filter(snippets.clone(), &both)), vec!["A"]);

        let frontend = FilterState {
            tag_ids: vec!["frontend".into()],
            ..Default::default()
        };
        assert_eq!(ids(&filter(snippets.clone(), &frontend)), vec!["A", "B"]);
    }

    #[test]
    fn test_search_is_case_insensitive_over_title_and_content() {
        let snippets = sample();

        let by_title = FilterState {
            search_text: "TYPED".into(),
            ..Default::default()
        };
        assert_eq!(ids(&filter(snippets.clone(), &by_title)), vec!["B"]);

        let by_content = FilterState {
            search_text: "Print(".into(),
            ..Default::default()
        };
        assert_eq!(ids(&filter(snippets.clone(), &by_content)), vec!["C"]);
    }

    #[test]
    fn test_language_is_exact() {
        let snippets = sample();
        let state = FilterState {
            language: "java".into(),
            ..Default::default()
        };
        assert!(filter(snippets.clone(), &state).is_empty());

        let state = FilterState {
            language: "python".into(),
            ..Default::default()
        };
        assert_eq!(ids(&filter(snippets.clone(), &state)), vec!["C"]);
    }

    #[test]
    fn test_all_criteria_combine() {
        let snippets = sample();
        let state = FilterState {
            search_text: "use".into(),
            language: "javascript".into(),
            tag_ids: vec!["frontend".into()],
        };
        assert_eq!(ids(&filter(snippets.clone(), &state)), vec!["A"]);

        let state = FilterState {
            search_text: "use".into(),
            language: "typescript".into(),
            tag_ids: vec!["frontend".into()],
        };
        assert!(filter(snippets.clone(), &state).is_empty());
    }

    #[test]
    fn test_filter_query_parsing() {
        let state: FilterState = FilterQuery {
            q: Some("hook".into()),
            language: None,
            tags: Some(" react, ,frontend ".into()),
        }
        .into();
        assert_eq!(state.search_text, "hook");
        assert_eq!(state.language, "");
        assert_eq!(state.tag_ids, vec!["react", "frontend"]);
    }

    #[test]
    fn test_available_languages_canonical_order() {
        let snippets = vec![
            view("1", "a", "a", "python", &[]),
            view("2", "b", "b", "javascript", &[]),
            view("3", "c", "c", "brainfuck", &[]),
            view("4", "d", "d", "python", &[]),
        ];
        assert_eq!(available_languages(&snippets), vec!["javascript", "python"]);
    }

    #[test]
    fn test_available_tags_only_used() {
        let snippets = sample();
        let all = vec![tag("backend"), tag("frontend"), tag("react"), tag("typescript")];
        let names: Vec<_> = available_tags(&snippets, &all)
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(names, vec!["frontend", "react", "typescript"]);
    }
}
