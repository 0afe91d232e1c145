//! URL-safe slug generation for new snippets.

use uuid::Uuid;

/// Length of the random suffix appended to every slug.
const SUFFIX_LEN: usize = 6;

/// Build a slug from a title: lower-cased, runs of anything outside `[a-z0-9]`
/// collapsed into one hyphen, edges trimmed, then a random suffix appended.
///
/// Uniqueness is not guaranteed here; the `snippets.slug` constraint enforces it.
pub fn generate_slug(title: &str) -> String {
    let base = slugify(title);
    let suffix = random_suffix();
    if base.is_empty() {
        suffix
    } else {
        format!("{}-{}", base, suffix)
    }
}

/// The deterministic part of the slug.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

fn random_suffix() -> String {
    // The leading hex digits of a v4 uuid are all random bits.
    let mut simple = Uuid::new_v4().simple().to_string();
    simple.truncate(SUFFIX_LEN);
    simple
}
